use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::core::audio::AudioBlob;

/// Result of a transcription request.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionOutput {
    /// Recognized text. Empty when the service returned no `text` field.
    pub text: String,
    /// The full response document, passed through unmodified.
    pub raw: Value,
}

#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("Transcription is not configured: {0}")]
    Configuration(String),

    #[error("Invalid transcription request: {0}")]
    InvalidRequest(String),

    #[error("Transcription request failed: {0}")]
    Network(String),

    #[error("Transcription service error ({status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("Invalid transcription response: {0}")]
    InvalidResponse(String),
}

/// One-shot transcription of an uploaded recording.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &AudioBlob) -> Result<TranscriptionOutput, TranscriptionError>;
}
