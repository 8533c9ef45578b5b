//! Text-to-speech for the practice client.
//!
//! Two flavours are exposed through [`SpeechSynthesizer`]:
//!
//! - sentence synthesis with word-boundary offsets (Azure Speech WebSocket
//!   protocol), used to highlight words during playback
//! - plain word synthesis (Azure Speech REST), used for single-word replay
//!
//! Both return a complete 16 kHz mono 16-bit WAV file.

mod azure;
mod protocol;
mod ssml;

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub use azure::{AzureSpeechSynthesizer, AzureSynthesisConfig};
pub use protocol::{ServerFrame, TICKS_PER_MILLISECOND};
pub use ssml::{build_ssml, escape_xml};

/// Audio plus the start offset of every spoken word, in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisOutput {
    pub audio: Bytes,
    pub word_offsets_ms: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationReason {
    /// The service or transport reported an error.
    Error,
    /// The stream ended before any audio was produced.
    EndOfStream,
}

impl fmt::Display for CancellationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("Error"),
            Self::EndOfStream => f.write_str("EndOfStream"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Speech synthesis is not configured: {0}")]
    Configuration(String),

    #[error("Speech synthesis canceled ({reason}): {details}")]
    Canceled {
        reason: CancellationReason,
        details: String,
    },
}

impl SynthesisError {
    pub(crate) fn canceled(details: impl Into<String>) -> Self {
        Self::Canceled {
            reason: CancellationReason::Error,
            details: details.into(),
        }
    }
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` and collect word-boundary offsets.
    async fn synthesize_with_word_boundaries(
        &self,
        text: &str,
    ) -> Result<SynthesisOutput, SynthesisError>;

    /// Synthesize `text` without boundary metadata.
    async fn synthesize(&self, text: &str) -> Result<Bytes, SynthesisError>;
}
