use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use reqwest::Client;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

use super::protocol::{self, ServerFrame};
use super::ssml::build_ssml;
use super::{CancellationReason, SpeechSynthesizer, SynthesisError, SynthesisOutput};
use crate::core::audio::{TARGET_CHANNELS, TARGET_SAMPLE_RATE, wav};

/// REST output format matching the WebSocket PCM, wrapped in RIFF.
const REST_OUTPUT_FORMAT: &str = "riff-16khz-16bit-mono-pcm";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Settings for the Azure Speech synthesis endpoints.
#[derive(Debug, Clone)]
pub struct AzureSynthesisConfig {
    pub subscription_key: String,
    pub voice: String,
    pub language: String,
    /// `https://{region}.tts.speech.microsoft.com/cognitiveservices/v1`
    pub rest_url: String,
    /// `wss://{region}.tts.speech.microsoft.com/cognitiveservices/websocket/v1`
    pub websocket_url: String,
    /// Longest silence tolerated between WebSocket frames.
    pub idle_timeout: Duration,
}

impl AzureSynthesisConfig {
    pub fn regional_rest_url(region: &str) -> String {
        format!("https://{region}.tts.speech.microsoft.com/cognitiveservices/v1")
    }

    pub fn regional_websocket_url(region: &str) -> String {
        format!("wss://{region}.tts.speech.microsoft.com/cognitiveservices/websocket/v1")
    }

    fn require_key(&self) -> Result<(), SynthesisError> {
        if self.subscription_key.trim().is_empty() {
            return Err(SynthesisError::Configuration(
                "SUBSCRIPTION_KEY is not set".to_string(),
            ));
        }
        Ok(())
    }
}

pub struct AzureSpeechSynthesizer {
    config: AzureSynthesisConfig,
    http_client: Client,
}

impl AzureSpeechSynthesizer {
    pub fn new(config: AzureSynthesisConfig, http_client: Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    fn websocket_request(
        &self,
        connection_id: &str,
    ) -> Result<tokio_tungstenite::tungstenite::handshake::client::Request, SynthesisError> {
        let mut url = Url::parse(&self.config.websocket_url).map_err(|e| {
            SynthesisError::Configuration(format!(
                "Invalid synthesis WebSocket URL '{}': {e}",
                self.config.websocket_url
            ))
        })?;
        url.query_pairs_mut()
            .append_pair("X-ConnectionId", connection_id);

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| SynthesisError::Configuration(format!("Invalid WebSocket URL: {e}")))?;
        let key = HeaderValue::from_str(&self.config.subscription_key).map_err(|e| {
            SynthesisError::Configuration(format!("Invalid subscription key: {e}"))
        })?;
        request
            .headers_mut()
            .insert("ocp-apim-subscription-key", key);
        Ok(request)
    }
}

#[async_trait]
impl SpeechSynthesizer for AzureSpeechSynthesizer {
    async fn synthesize_with_word_boundaries(
        &self,
        text: &str,
    ) -> Result<SynthesisOutput, SynthesisError> {
        self.config.require_key()?;

        let connection_id = Uuid::new_v4().simple().to_string();
        let request = self.websocket_request(&connection_id)?;

        let (ws_stream, _response) = timeout(self.config.idle_timeout, connect_async(request))
            .await
            .map_err(|_| SynthesisError::canceled("Timed out connecting to synthesis service"))?
            .map_err(|e| {
                SynthesisError::canceled(format!("Failed to connect to synthesis service: {e}"))
            })?;
        debug!(connection_id = %connection_id, "Connected to synthesis WebSocket");

        let (mut ws_sink, mut ws_stream) = ws_stream.split();
        let request_id = Uuid::new_v4().simple().to_string();
        let ssml = build_ssml(text, &self.config.voice, &self.config.language);

        for message in [
            protocol::synthesis_context(&request_id),
            protocol::ssml_message(&request_id, &ssml),
        ] {
            ws_sink
                .send(Message::Text(message.into()))
                .await
                .map_err(|e| SynthesisError::canceled(format!("Failed to send request: {e}")))?;
        }

        let mut pcm: Vec<u8> = Vec::new();
        let mut word_offsets_ms: Vec<f64> = Vec::new();

        loop {
            let frame = match timeout(self.config.idle_timeout, ws_stream.next()).await {
                Ok(Some(Ok(Message::Text(text)))) => protocol::parse_text_frame(&text),
                Ok(Some(Ok(Message::Binary(data)))) => protocol::parse_binary_frame(&data),
                Ok(Some(Ok(Message::Close(close_frame)))) => {
                    let details = close_frame
                        .map(|frame| format!("{} {}", frame.code, frame.reason))
                        .unwrap_or_else(|| "connection closed".to_string());
                    warn!(details = %details, "Synthesis WebSocket closed before turn.end");
                    return Err(SynthesisError::canceled(details));
                }
                Ok(Some(Ok(_))) => continue,
                Ok(Some(Err(e))) => {
                    error!("Synthesis WebSocket error: {}", e);
                    return Err(SynthesisError::canceled(format!("WebSocket error: {e}")));
                }
                Ok(None) => {
                    return Err(SynthesisError::canceled(
                        "Synthesis stream ended before turn.end",
                    ));
                }
                Err(_elapsed) => {
                    return Err(SynthesisError::canceled(format!(
                        "No message from synthesis service for {:?}",
                        self.config.idle_timeout
                    )));
                }
            };

            match frame {
                Some(ServerFrame::Audio(chunk)) => pcm.extend_from_slice(&chunk),
                Some(ServerFrame::WordBoundaries(offsets)) => word_offsets_ms.extend(offsets),
                Some(ServerFrame::TurnEnd) => break,
                Some(ServerFrame::TurnStart) | Some(ServerFrame::Other(_)) | None => {}
            }
        }

        let _ = ws_sink.send(Message::Close(None)).await;

        if pcm.is_empty() {
            return Err(SynthesisError::Canceled {
                reason: CancellationReason::EndOfStream,
                details: "No audio received".to_string(),
            });
        }

        let audio = wav::wrap_pcm16le(&pcm, TARGET_SAMPLE_RATE, TARGET_CHANNELS)
            .map_err(|e| SynthesisError::canceled(format!("Failed to package audio: {e}")))?;

        info!(
            bytes = audio.len(),
            words = word_offsets_ms.len(),
            "Speech synthesized"
        );

        Ok(SynthesisOutput {
            audio: Bytes::from(audio),
            word_offsets_ms,
        })
    }

    async fn synthesize(&self, text: &str) -> Result<Bytes, SynthesisError> {
        self.config.require_key()?;
        let ssml = build_ssml(text, &self.config.voice, &self.config.language);

        let response = self
            .http_client
            .post(&self.config.rest_url)
            .header("Ocp-Apim-Subscription-Key", &self.config.subscription_key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", REST_OUTPUT_FORMAT)
            .header("User-Agent", USER_AGENT)
            .body(ssml)
            .send()
            .await
            .map_err(|e| SynthesisError::canceled(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "Azure TTS API error: {}", body);
            return Err(SynthesisError::canceled(format!(
                "Azure TTS API error ({status}): {body}"
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::canceled(format!("Failed to read audio: {e}")))?;
        if audio.is_empty() {
            return Err(SynthesisError::Canceled {
                reason: CancellationReason::EndOfStream,
                details: "No audio received".to_string(),
            });
        }

        debug!(bytes = audio.len(), "Word synthesized");
        Ok(audio)
    }
}
