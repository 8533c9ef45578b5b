use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::{debug, error, info};

use super::config::{UPLOAD_FILE_NAME, WhisperConfig};
use super::messages::{AzureErrorResponse, TranscriptionResponse};
use crate::core::audio::AudioBlob;
use crate::core::stt::base::{Transcriber, TranscriptionError, TranscriptionOutput};

/// Whisper client backed by a shared `reqwest::Client`.
///
/// Configuration is checked per call so that a gateway without transcription
/// credentials still starts and only `/ackaud` reports the problem.
#[derive(Debug, Clone)]
pub struct WhisperTranscriber {
    config: WhisperConfig,
    http_client: Client,
}

impl WhisperTranscriber {
    pub fn new(config: WhisperConfig, http_client: Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    fn build_form(audio: &AudioBlob) -> Result<Form, TranscriptionError> {
        let part = Part::bytes(audio.data.to_vec())
            .file_name(UPLOAD_FILE_NAME)
            .mime_str(&audio.content_type)
            .map_err(|e| {
                TranscriptionError::InvalidRequest(format!(
                    "Invalid content type '{}': {e}",
                    audio.content_type
                ))
            })?;

        Ok(Form::new().part("file", part))
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: &AudioBlob) -> Result<TranscriptionOutput, TranscriptionError> {
        self.config
            .validate()
            .map_err(TranscriptionError::Configuration)?;

        debug!(
            bytes = audio.len(),
            content_type = %audio.content_type,
            "Sending audio for transcription"
        );

        let response = self
            .http_client
            .post(&self.config.url)
            .header("api-key", &self.config.api_key)
            .multipart(Self::build_form(audio)?)
            .send()
            .await
            .map_err(|e| TranscriptionError::Network(format!("Request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TranscriptionError::Network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            match serde_json::from_str::<AzureErrorResponse>(&body) {
                Ok(envelope) => error!(
                    status = status.as_u16(),
                    code = envelope.error.code.as_deref().unwrap_or("unknown"),
                    "Whisper API error: {}",
                    envelope.error.message
                ),
                Err(_) => error!(status = status.as_u16(), "Whisper API error: {}", body),
            }
            return Err(TranscriptionError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let raw: Value = serde_json::from_str(&body)
            .map_err(|e| TranscriptionError::InvalidResponse(format!("{e}: {body}")))?;
        let parsed: TranscriptionResponse = serde_json::from_value(raw.clone())
            .map_err(|e| TranscriptionError::InvalidResponse(e.to_string()))?;

        info!(characters = parsed.text.len(), "Transcription complete");

        Ok(TranscriptionOutput {
            text: parsed.text,
            raw,
        })
    }
}
