//! Azure Speech pronunciation assessment (short-audio REST).
//!
//! The normalized recording is streamed to the recognition endpoint together
//! with a base64 `Pronunciation-Assessment` header describing the reference
//! text and grading scheme. The service returns an `NBest` list whose first
//! candidate carries the overall `PronScore`.

mod client;
mod config;
mod messages;


use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::core::audio::NormalizedAudio;

pub use client::{AzurePronunciationAssessor, CHUNK_SIZE, split_chunks};
pub use config::{AssessmentConfig, AzureAssessmentEndpoint};
pub use messages::extract_pron_score;

/// Numeric score plus the service's full report.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentOutput {
    /// `NBest[0].PronScore`, 0 to 100.
    pub pron_score: f64,
    /// The response document, unmodified.
    pub raw: Value,
}

#[derive(Debug, Error)]
pub enum AssessmentError {
    #[error("Pronunciation assessment is not configured: {0}")]
    Configuration(String),

    #[error("Pronunciation assessment request failed: {0}")]
    Network(String),

    #[error("Pronunciation API call failed with status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Pronunciation assessment returned no candidates (RecognitionStatus: {recognition_status})")]
    NoCandidates { recognition_status: String },

    #[error("Malformed pronunciation assessment response: {0}")]
    MalformedResponse(String),
}

#[async_trait]
pub trait PronunciationAssessor: Send + Sync {
    async fn assess(
        &self,
        reference_text: &str,
        audio: NormalizedAudio,
    ) -> Result<AssessmentOutput, AssessmentError>;
}
