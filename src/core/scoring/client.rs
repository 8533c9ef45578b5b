use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use url::Url;

use super::band::BandScore;
use super::prompt::{ChatMessage, build_messages};
use super::{BandScorer, ScoringError};

/// Azure OpenAI chat deployment coordinates.
#[derive(Debug, Clone, Default)]
pub struct ChatEndpoint {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com/`.
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
    pub api_version: String,
}

impl ChatEndpoint {
    pub fn completions_url(&self) -> Result<Url, String> {
        if self.endpoint.trim().is_empty() {
            return Err("OPENAI_ENDPOINT is not set".to_string());
        }
        if self.api_key.trim().is_empty() {
            return Err("OPENAI_API is not set".to_string());
        }
        let raw = format!(
            "{}/openai/deployments/{}/chat/completions",
            self.endpoint.trim_end_matches('/'),
            self.deployment
        );
        let mut url = Url::parse(&raw).map_err(|e| format!("Invalid OPENAI_ENDPOINT: {e}"))?;
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct AzureChatScorer {
    endpoint: ChatEndpoint,
    http_client: Client,
}

impl AzureChatScorer {
    pub fn new(endpoint: ChatEndpoint, http_client: Client) -> Self {
        Self {
            endpoint,
            http_client,
        }
    }
}

#[async_trait]
impl BandScorer for AzureChatScorer {
    async fn score(&self, transcript: &str, pron_score: f64) -> Result<BandScore, ScoringError> {
        let url = self
            .endpoint
            .completions_url()
            .map_err(ScoringError::Configuration)?;
        let messages = build_messages(transcript, pron_score);

        let response = self
            .http_client
            .post(url)
            .header("api-key", &self.endpoint.api_key)
            .json(&ChatRequest {
                messages: &messages,
            })
            .send()
            .await
            .map_err(|e| ScoringError::Network(format!("Request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ScoringError::Network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            error!(status = status.as_u16(), "Chat completion API error: {}", body);
            return Err(ScoringError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ScoringError::MalformedResponse(format!("{e}: {body}")))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| {
                ScoringError::MalformedResponse("choices[0].message.content missing".to_string())
            })?;

        match BandScore::parse(&content) {
            Some(band) => {
                info!(band = %band, "Band score received");
                Ok(band)
            }
            None => {
                warn!(reply = %content.trim(), "Scoring reply is not a valid band");
                Err(ScoringError::InvalidBand(content.trim().to_string()))
            }
        }
    }
}
