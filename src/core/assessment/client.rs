use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use reqwest::{Body, Client};
use serde_json::Value;
use tracing::{debug, error, info};

use super::config::{AssessmentConfig, AzureAssessmentEndpoint};
use super::messages::extract_pron_score;
use super::{AssessmentError, AssessmentOutput, PronunciationAssessor};
use crate::core::audio::NormalizedAudio;

/// Upload chunk size in bytes.
pub const CHUNK_SIZE: usize = 1024;

/// Split a payload into consecutive `chunk_size` slices without copying.
/// The final slice may be shorter.
pub fn split_chunks(data: &Bytes, chunk_size: usize) -> Vec<Bytes> {
    let chunk_size = chunk_size.max(1);
    (0..data.len())
        .step_by(chunk_size)
        .map(|start| data.slice(start..(start + chunk_size).min(data.len())))
        .collect()
}

pub struct AzurePronunciationAssessor {
    endpoint: AzureAssessmentEndpoint,
    http_client: Client,
}

impl AzurePronunciationAssessor {
    pub fn new(endpoint: AzureAssessmentEndpoint, http_client: Client) -> Self {
        Self {
            endpoint,
            http_client,
        }
    }
}

#[async_trait]
impl PronunciationAssessor for AzurePronunciationAssessor {
    async fn assess(
        &self,
        reference_text: &str,
        audio: NormalizedAudio,
    ) -> Result<AssessmentOutput, AssessmentError> {
        let url = self
            .endpoint
            .request_url()
            .map_err(AssessmentError::Configuration)?;
        let params = AssessmentConfig::new(reference_text);

        let chunks = split_chunks(audio.bytes(), CHUNK_SIZE);
        debug!(
            chunks = chunks.len(),
            bytes = audio.bytes().len(),
            "Streaming audio for pronunciation assessment"
        );
        // An unsized stream body makes hyper use chunked transfer encoding.
        let body = Body::wrap_stream(stream::iter(
            chunks.into_iter().map(Ok::<Bytes, std::io::Error>),
        ));

        let response = self
            .http_client
            .post(url)
            .header("Accept", "application/json;text/xml")
            .header("Connection", "Keep-Alive")
            .header("Content-Type", NormalizedAudio::CONTENT_TYPE)
            .header("Ocp-Apim-Subscription-Key", &self.endpoint.subscription_key)
            .header("Pronunciation-Assessment", params.header_value())
            .header("Expect", "100-continue")
            .body(body)
            .send()
            .await
            .map_err(|e| AssessmentError::Network(format!("Request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AssessmentError::Network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            error!(status = status.as_u16(), "Pronunciation API error: {}", text);
            return Err(AssessmentError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        let raw: Value = serde_json::from_str(&text)
            .map_err(|e| AssessmentError::MalformedResponse(format!("{e}: {text}")))?;
        let pron_score = extract_pron_score(&raw)?;

        info!(pron_score, "Pronunciation assessment complete");
        Ok(AssessmentOutput { pron_score, raw })
    }
}
