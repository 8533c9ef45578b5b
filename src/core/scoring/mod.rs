//! IELTS band estimation via an Azure OpenAI chat deployment.

mod band;
mod client;
mod prompt;

use async_trait::async_trait;
use thiserror::Error;

pub use band::{ALLOWED_BANDS, BandScore};
pub use client::{AzureChatScorer, ChatEndpoint};
pub use prompt::{ChatMessage, Role, build_messages};

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Scoring is not configured: {0}")]
    Configuration(String),

    #[error("Scoring request failed: {0}")]
    Network(String),

    #[error("Scoring service error ({status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("Malformed scoring response: {0}")]
    MalformedResponse(String),

    #[error("Scoring service returned an invalid band score: '{0}'")]
    InvalidBand(String),
}

#[async_trait]
pub trait BandScorer: Send + Sync {
    async fn score(&self, transcript: &str, pron_score: f64) -> Result<BandScore, ScoringError>;
}
