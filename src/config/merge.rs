use std::path::PathBuf;

use super::env::EnvConfig;
use super::validation::validate_tls_paths;
use super::yaml::YamlConfig;
use super::{
    DEFAULT_HOST, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_OPENAI_API_VERSION, DEFAULT_OPENAI_DEPLOYMENT,
    DEFAULT_PORT, DEFAULT_RATE_LIMIT_BURST_SIZE, DEFAULT_RATE_LIMIT_REQUESTS_PER_SECOND,
    DEFAULT_REGION, DEFAULT_SPEECH_LANGUAGE, DEFAULT_TTS_VOICE, ServerConfig,
};

/// Build the final configuration: YAML over environment over defaults.
pub fn merge_config(yaml: Option<YamlConfig>) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let env = EnvConfig::from_env()?;
    let yaml = yaml.unwrap_or_default();

    let server = yaml.server.unwrap_or_default();
    let tls = server.tls.unwrap_or_default();
    let speech = yaml.azure_speech.unwrap_or_default();
    let whisper = yaml.whisper.unwrap_or_default();
    let openai = yaml.openai.unwrap_or_default();
    let security = yaml.security.unwrap_or_default();

    let tls = validate_tls_paths(
        tls.cert_path.map(PathBuf::from).or(env.tls_cert_path),
        tls.key_path.map(PathBuf::from).or(env.tls_key_path),
    )?;

    Ok(ServerConfig {
        host: server
            .host
            .or(env.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: server.port.or(env.port).unwrap_or(DEFAULT_PORT),
        tls,
        static_dir: server.static_dir.map(PathBuf::from).or(env.static_dir),
        max_upload_bytes: server
            .max_upload_bytes
            .or(env.max_upload_bytes)
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        upstream_timeout_seconds: server
            .upstream_timeout_seconds
            .or(env.upstream_timeout_seconds),

        azure_speech_subscription_key: speech
            .subscription_key
            .or(env.azure_speech_subscription_key),
        azure_speech_region: speech
            .region
            .or(env.azure_speech_region)
            .unwrap_or_else(|| DEFAULT_REGION.to_string()),
        speech_language: speech
            .language
            .or(env.speech_language)
            .unwrap_or_else(|| DEFAULT_SPEECH_LANGUAGE.to_string()),
        tts_voice: speech
            .voice
            .or(env.tts_voice)
            .unwrap_or_else(|| DEFAULT_TTS_VOICE.to_string()),
        azure_token_url: speech.token_url.or(env.azure_token_url),
        azure_stt_url: speech.stt_url.or(env.azure_stt_url),
        azure_tts_url: speech.tts_url.or(env.azure_tts_url),
        azure_tts_ws_url: speech.tts_ws_url.or(env.azure_tts_ws_url),

        whisper_url: whisper.url.or(env.whisper_url),
        whisper_api_key: whisper.api_key.or(env.whisper_api_key),

        openai_endpoint: openai.endpoint.or(env.openai_endpoint),
        openai_api_key: openai.api_key.or(env.openai_api_key),
        openai_deployment: openai
            .deployment
            .or(env.openai_deployment)
            .unwrap_or_else(|| DEFAULT_OPENAI_DEPLOYMENT.to_string()),
        openai_api_version: openai
            .api_version
            .or(env.openai_api_version)
            .unwrap_or_else(|| DEFAULT_OPENAI_API_VERSION.to_string()),

        cors_allowed_origins: security.cors_allowed_origins.or(env.cors_allowed_origins),
        rate_limit_requests_per_second: security
            .rate_limit_requests_per_second
            .or(env.rate_limit_requests_per_second)
            .unwrap_or(DEFAULT_RATE_LIMIT_REQUESTS_PER_SECOND),
        rate_limit_burst_size: security
            .rate_limit_burst_size
            .or(env.rate_limit_burst_size)
            .unwrap_or(DEFAULT_RATE_LIMIT_BURST_SIZE),
    })
}
