use std::sync::Arc;

use reqwest::Client;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::core::assessment::AzurePronunciationAssessor;
use crate::core::pipeline::AssessmentPipeline;
use crate::core::scoring::AzureChatScorer;
use crate::core::stt::WhisperTranscriber;
use crate::core::token::{AzureTokenIssuer, TokenIssuer};
use crate::core::tts::{AzureSpeechSynthesizer, SpeechSynthesizer};

/// Shared, read-only application state.
pub struct AppState {
    pub config: ServerConfig,
    pub pipeline: AssessmentPipeline,
    pub token_issuer: Arc<dyn TokenIssuer>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl AppState {
    /// Build every upstream client from `config` around one pooled HTTP client.
    pub fn new(config: ServerConfig) -> Result<Arc<Self>, reqwest::Error> {
        let mut builder = Client::builder().pool_max_idle_per_host(8);
        if let Some(timeout) = config.upstream_timeout() {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        for (provider, route) in [
            ("azure-speech", "/gettoken, /ackaud, /gettts, /getttsforword"),
            ("whisper", "/ackaud"),
            ("openai", "/ackaud"),
        ] {
            if config.get_api_key(provider).is_err() {
                warn!(provider, route, "Credential missing; route will fail until configured");
            }
        }

        let pipeline = AssessmentPipeline::new(
            Arc::new(WhisperTranscriber::new(
                config.whisper_config(),
                http_client.clone(),
            )),
            Arc::new(AzurePronunciationAssessor::new(
                config.pronunciation_endpoint(),
                http_client.clone(),
            )),
            Arc::new(AzureChatScorer::new(
                config.chat_endpoint(),
                http_client.clone(),
            )),
        );
        let token_issuer = Arc::new(AzureTokenIssuer::new(
            config.token_url(),
            config.get_api_key("azure-speech").unwrap_or_default(),
            http_client.clone(),
        ));
        let synthesizer = Arc::new(AzureSpeechSynthesizer::new(
            config.synthesis_config(),
            http_client,
        ));

        info!(
            region = %config.azure_speech_region,
            language = %config.speech_language,
            voice = %config.tts_voice,
            "Application state initialized"
        );

        Ok(Self::from_parts(config, pipeline, token_issuer, synthesizer))
    }

    /// Assemble state from prebuilt collaborators.
    pub fn from_parts(
        config: ServerConfig,
        pipeline: AssessmentPipeline,
        token_issuer: Arc<dyn TokenIssuer>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            pipeline,
            token_issuer,
            synthesizer,
        })
    }
}
