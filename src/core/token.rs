//! Short-lived Azure Speech authorization tokens for the browser client.

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token issuance is not configured: {0}")]
    Configuration(String),

    #[error("Token request failed: {0}")]
    Network(String),

    #[error("Token service error ({status}): {body}")]
    Upstream { status: u16, body: String },
}

#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue_token(&self) -> Result<String, TokenError>;
}

/// Exchanges the subscription key for a token at the regional STS endpoint.
pub struct AzureTokenIssuer {
    url: String,
    subscription_key: String,
    http_client: Client,
}

impl AzureTokenIssuer {
    pub fn regional_url(region: &str) -> String {
        format!("https://{region}.api.cognitive.microsoft.com/sts/v1.0/issueToken")
    }

    pub fn new(url: impl Into<String>, subscription_key: impl Into<String>, http_client: Client) -> Self {
        Self {
            url: url.into(),
            subscription_key: subscription_key.into(),
            http_client,
        }
    }
}

#[async_trait]
impl TokenIssuer for AzureTokenIssuer {
    async fn issue_token(&self) -> Result<String, TokenError> {
        if self.subscription_key.trim().is_empty() {
            return Err(TokenError::Configuration(
                "SUBSCRIPTION_KEY is not set".to_string(),
            ));
        }

        let response = self
            .http_client
            .post(&self.url)
            .header("Ocp-Apim-Subscription-Key", &self.subscription_key)
            .body("")
            .send()
            .await
            .map_err(|e| TokenError::Network(format!("Request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TokenError::Network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            error!(status = status.as_u16(), "Token API error: {}", body);
            return Err(TokenError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Issued speech token");
        Ok(body)
    }
}
