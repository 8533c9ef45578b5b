use std::path::PathBuf;

use super::utils::{env_first, env_parse, env_string};

/// Values read from the process environment (including anything `.env`
/// loaded at startup). Every field is optional; defaults are applied when
/// merging.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls_cert_path: Option<PathBuf>,
    pub tls_key_path: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
    pub max_upload_bytes: Option<usize>,
    pub upstream_timeout_seconds: Option<u64>,

    pub azure_speech_subscription_key: Option<String>,
    pub azure_speech_region: Option<String>,
    pub speech_language: Option<String>,
    pub tts_voice: Option<String>,
    pub azure_token_url: Option<String>,
    pub azure_stt_url: Option<String>,
    pub azure_tts_url: Option<String>,
    pub azure_tts_ws_url: Option<String>,

    pub whisper_url: Option<String>,
    pub whisper_api_key: Option<String>,

    pub openai_endpoint: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_deployment: Option<String>,
    pub openai_api_version: Option<String>,

    pub cors_allowed_origins: Option<String>,
    pub rate_limit_requests_per_second: Option<u32>,
    pub rate_limit_burst_size: Option<u32>,
}

impl EnvConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            host: env_string("HOST"),
            port: env_parse("PORT")?,
            tls_cert_path: env_string("TLS_CERT_PATH").map(PathBuf::from),
            tls_key_path: env_string("TLS_KEY_PATH").map(PathBuf::from),
            static_dir: env_string("STATIC_DIR").map(PathBuf::from),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES")?,
            upstream_timeout_seconds: env_parse("UPSTREAM_TIMEOUT_SECONDS")?,

            azure_speech_subscription_key: env_first(&[
                "SUBSCRIPTION_KEY",
                "AZURE_SPEECH_SUBSCRIPTION_KEY",
            ]),
            azure_speech_region: env_string("AZURE_SPEECH_REGION"),
            speech_language: env_string("SPEECH_LANGUAGE"),
            tts_voice: env_string("TTS_VOICE"),
            azure_token_url: env_string("AZURE_TOKEN_URL"),
            azure_stt_url: env_string("AZURE_STT_URL"),
            azure_tts_url: env_string("AZURE_TTS_URL"),
            azure_tts_ws_url: env_string("AZURE_TTS_WS_URL"),

            whisper_url: env_string("WHISPER_URL"),
            whisper_api_key: env_string("WHISPER_API_KEY"),

            openai_endpoint: env_string("OPENAI_ENDPOINT"),
            openai_api_key: env_first(&["OPENAI_API", "OPENAI_API_KEY"]),
            openai_deployment: env_string("OPENAI_DEPLOYMENT"),
            openai_api_version: env_string("OPENAI_API_VERSION"),

            cors_allowed_origins: env_string("CORS_ALLOWED_ORIGINS"),
            rate_limit_requests_per_second: env_parse("RATE_LIMIT_REQUESTS_PER_SECOND")?,
            rate_limit_burst_size: env_parse("RATE_LIMIT_BURST_SIZE")?,
        })
    }
}
