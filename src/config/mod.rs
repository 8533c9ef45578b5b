//! Configuration module for the pronunciation gateway
//!
//! Configuration comes from `.env` files, environment variables and an optional
//! YAML file. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Environment parsing helpers
//!
//! # Example
//! ```rust,no_run
//! use pronunciation_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//!
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

use crate::core::assessment::AzureAssessmentEndpoint;
use crate::core::scoring::ChatEndpoint;
use crate::core::stt::WhisperConfig;
use crate::core::token::AzureTokenIssuer;
use crate::core::tts::AzureSynthesisConfig;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_REGION: &str = "southeastasia";
pub const DEFAULT_SPEECH_LANGUAGE: &str = "en-US";
pub const DEFAULT_TTS_VOICE: &str = "en-US-JennyNeural";
pub const DEFAULT_OPENAI_DEPLOYMENT: &str = "gpt-4o";
pub const DEFAULT_OPENAI_API_VERSION: &str = "2023-03-15-preview";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;
pub const DEFAULT_RATE_LIMIT_REQUESTS_PER_SECOND: u32 = 60;
pub const DEFAULT_RATE_LIMIT_BURST_SIZE: u32 = 10;

/// Idle limit for the synthesis WebSocket when no upstream timeout is set.
const DEFAULT_SYNTHESIS_IDLE_SECONDS: u64 = 30;

/// TLS configuration for HTTPS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
///
/// Built once at startup and shared read-only. Credentials are optional:
/// a route whose upstream is not configured fails when called, the rest of
/// the server keeps working.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,
    pub tls: Option<TlsConfig>,
    /// Directory served at `/` (the browser client)
    pub static_dir: Option<PathBuf>,
    /// Request body limit for uploads
    pub max_upload_bytes: usize,
    /// Overall timeout for upstream HTTP calls; `None` keeps the client default
    pub upstream_timeout_seconds: Option<u64>,

    // Azure Speech
    pub azure_speech_subscription_key: Option<String>,
    pub azure_speech_region: String,
    /// Recognition locale, e.g. "en-US"
    pub speech_language: String,
    /// Synthesis voice, e.g. "en-US-JennyNeural"
    pub tts_voice: String,
    pub azure_token_url: Option<String>,
    pub azure_stt_url: Option<String>,
    pub azure_tts_url: Option<String>,
    pub azure_tts_ws_url: Option<String>,

    // Whisper deployment (full transcription URL)
    pub whisper_url: Option<String>,
    pub whisper_api_key: Option<String>,

    // Azure OpenAI chat deployment
    pub openai_endpoint: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_deployment: String,
    pub openai_api_version: String,

    // Security configuration
    /// CORS allowed origins (comma-separated list or "*" for all)
    /// Default: None (CORS disabled, same-origin only)
    pub cors_allowed_origins: Option<String>,
    /// Maximum requests per second per IP address
    pub rate_limit_requests_per_second: u32,
    /// Maximum burst size for rate limiting
    pub rate_limit_burst_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            tls: None,
            static_dir: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            upstream_timeout_seconds: None,
            azure_speech_subscription_key: None,
            azure_speech_region: DEFAULT_REGION.to_string(),
            speech_language: DEFAULT_SPEECH_LANGUAGE.to_string(),
            tts_voice: DEFAULT_TTS_VOICE.to_string(),
            azure_token_url: None,
            azure_stt_url: None,
            azure_tts_url: None,
            azure_tts_ws_url: None,
            whisper_url: None,
            whisper_api_key: None,
            openai_endpoint: None,
            openai_api_key: None,
            openai_deployment: DEFAULT_OPENAI_DEPLOYMENT.to_string(),
            openai_api_version: DEFAULT_OPENAI_API_VERSION.to_string(),
            cors_allowed_origins: None,
            rate_limit_requests_per_second: DEFAULT_RATE_LIMIT_REQUESTS_PER_SECOND,
            rate_limit_burst_size: DEFAULT_RATE_LIMIT_BURST_SIZE,
        }
    }
}

/// Zeroize secret fields when the configuration is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        for secret in [
            &mut self.azure_speech_subscription_key,
            &mut self.whisper_api_key,
            &mut self.openai_api_key,
        ]
        .into_iter()
        .flatten()
        {
            secret.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables (and `.env`, loaded in
    /// `main`) with defaults, then validate it.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        validation::validate_server_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a YAML file on top of the environment.
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, an environment
    /// variable has an invalid format, or validation fails.
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate_server_config(&config)?;
        Ok(config)
    }

    /// Get the server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    pub fn upstream_timeout(&self) -> Option<Duration> {
        self.upstream_timeout_seconds.map(Duration::from_secs)
    }

    /// Get the credential for an upstream service.
    ///
    /// # Arguments
    /// * `provider` - "azure-speech", "whisper" or "openai"
    pub fn get_api_key(&self, provider: &str) -> Result<String, String> {
        match provider.to_lowercase().as_str() {
            "azure-speech" | "azure" | "microsoft-azure" => self
                .azure_speech_subscription_key
                .clone()
                .ok_or_else(|| {
                    "Azure Speech subscription key not configured in server environment"
                        .to_string()
                }),
            "whisper" => self.whisper_api_key.clone().ok_or_else(|| {
                "Whisper API key not configured in server environment".to_string()
            }),
            "openai" | "azure-openai" => self.openai_api_key.clone().ok_or_else(|| {
                "OpenAI API key not configured in server environment".to_string()
            }),
            _ => Err(format!("Unsupported provider: {provider}")),
        }
    }

    pub fn token_url(&self) -> String {
        self.azure_token_url
            .clone()
            .unwrap_or_else(|| AzureTokenIssuer::regional_url(&self.azure_speech_region))
    }

    pub fn pronunciation_endpoint(&self) -> AzureAssessmentEndpoint {
        AzureAssessmentEndpoint {
            subscription_key: self.get_api_key("azure-speech").unwrap_or_default(),
            url: self.azure_stt_url.clone().unwrap_or_else(|| {
                AzureAssessmentEndpoint::regional_url(&self.azure_speech_region)
            }),
            language: self.speech_language.clone(),
        }
    }

    pub fn whisper_config(&self) -> WhisperConfig {
        WhisperConfig::new(
            self.whisper_url.clone().unwrap_or_default(),
            self.get_api_key("whisper").unwrap_or_default(),
        )
    }

    pub fn chat_endpoint(&self) -> ChatEndpoint {
        ChatEndpoint {
            endpoint: self.openai_endpoint.clone().unwrap_or_default(),
            api_key: self.get_api_key("openai").unwrap_or_default(),
            deployment: self.openai_deployment.clone(),
            api_version: self.openai_api_version.clone(),
        }
    }

    pub fn synthesis_config(&self) -> AzureSynthesisConfig {
        AzureSynthesisConfig {
            subscription_key: self.get_api_key("azure-speech").unwrap_or_default(),
            voice: self.tts_voice.clone(),
            language: self.speech_language.clone(),
            rest_url: self.azure_tts_url.clone().unwrap_or_else(|| {
                AzureSynthesisConfig::regional_rest_url(&self.azure_speech_region)
            }),
            websocket_url: self.azure_tts_ws_url.clone().unwrap_or_else(|| {
                AzureSynthesisConfig::regional_websocket_url(&self.azure_speech_region)
            }),
            idle_timeout: Duration::from_secs(
                self.upstream_timeout_seconds
                    .unwrap_or(DEFAULT_SYNTHESIS_IDLE_SECONDS),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::fs;
    use tempfile::TempDir;

    const ENV_KEYS: &[&str] = &[
        "HOST",
        "PORT",
        "TLS_CERT_PATH",
        "TLS_KEY_PATH",
        "STATIC_DIR",
        "MAX_UPLOAD_BYTES",
        "UPSTREAM_TIMEOUT_SECONDS",
        "SUBSCRIPTION_KEY",
        "AZURE_SPEECH_SUBSCRIPTION_KEY",
        "AZURE_SPEECH_REGION",
        "SPEECH_LANGUAGE",
        "TTS_VOICE",
        "AZURE_TOKEN_URL",
        "AZURE_STT_URL",
        "AZURE_TTS_URL",
        "AZURE_TTS_WS_URL",
        "WHISPER_URL",
        "WHISPER_API_KEY",
        "OPENAI_ENDPOINT",
        "OPENAI_API",
        "OPENAI_API_KEY",
        "OPENAI_DEPLOYMENT",
        "OPENAI_API_VERSION",
        "CORS_ALLOWED_ORIGINS",
        "RATE_LIMIT_REQUESTS_PER_SECOND",
        "RATE_LIMIT_BURST_SIZE",
    ];

    fn cleanup_env_vars() {
        unsafe {
            for key in ENV_KEYS {
                env::remove_var(key);
            }
        }
    }

    fn test_config() -> ServerConfig {
        let mut config = ServerConfig::default();
        config.azure_speech_subscription_key = Some("speech-key".to_string());
        config.whisper_api_key = Some("whisper-key".to_string());
        config.whisper_url = Some("https://res.openai.azure.com/whisper".to_string());
        config.openai_api_key = Some("openai-key".to_string());
        config.openai_endpoint = Some("https://res.openai.azure.com/".to_string());
        config
    }

    #[test]
    fn test_get_api_key_success() {
        let config = test_config();
        assert_eq!(config.get_api_key("azure-speech").unwrap(), "speech-key");
        assert_eq!(config.get_api_key("AZURE").unwrap(), "speech-key");
        assert_eq!(config.get_api_key("whisper").unwrap(), "whisper-key");
        assert_eq!(config.get_api_key("OpenAI").unwrap(), "openai-key");
    }

    #[test]
    fn test_get_api_key_missing() {
        let config = ServerConfig::default();
        assert!(
            config
                .get_api_key("whisper")
                .unwrap_err()
                .contains("not configured")
        );
        assert!(
            config
                .get_api_key("deepgram")
                .unwrap_err()
                .contains("Unsupported provider")
        );
    }

    #[test]
    fn test_regional_urls() {
        let config = test_config();
        assert_eq!(
            config.token_url(),
            "https://southeastasia.api.cognitive.microsoft.com/sts/v1.0/issueToken"
        );
        assert_eq!(
            config.pronunciation_endpoint().url,
            "https://southeastasia.stt.speech.microsoft.com/speech/recognition/conversation/cognitiveservices/v1"
        );
        let synthesis = config.synthesis_config();
        assert_eq!(
            synthesis.rest_url,
            "https://southeastasia.tts.speech.microsoft.com/cognitiveservices/v1"
        );
        assert_eq!(
            synthesis.websocket_url,
            "wss://southeastasia.tts.speech.microsoft.com/cognitiveservices/websocket/v1"
        );
        assert_eq!(synthesis.idle_timeout, Duration::from_secs(30));
        assert_eq!(synthesis.voice, "en-US-JennyNeural");
    }

    #[test]
    fn test_url_overrides() {
        let mut config = test_config();
        config.azure_token_url = Some("http://proxy/token".to_string());
        config.azure_stt_url = Some("http://proxy/stt".to_string());
        config.upstream_timeout_seconds = Some(12);
        assert_eq!(config.token_url(), "http://proxy/token");
        assert_eq!(config.pronunciation_endpoint().url, "http://proxy/stt");
        assert_eq!(config.synthesis_config().idle_timeout, Duration::from_secs(12));
        assert_eq!(config.upstream_timeout(), Some(Duration::from_secs(12)));
    }

    #[test]
    fn test_address() {
        let mut config = ServerConfig::default();
        config.host = "127.0.0.1".to_string();
        config.port = 8080;
        assert_eq!(config.address(), "127.0.0.1:8080");
        assert!(!config.is_tls_enabled());
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        cleanup_env_vars();

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5000);
        assert_eq!(config.azure_speech_region, "southeastasia");
        assert_eq!(config.openai_deployment, "gpt-4o");
        assert_eq!(config.openai_api_version, "2023-03-15-preview");
        assert_eq!(config.max_upload_bytes, 25 * 1024 * 1024);
        assert!(config.azure_speech_subscription_key.is_none());
        assert!(config.upstream_timeout_seconds.is_none());

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_aliases() {
        cleanup_env_vars();
        unsafe {
            env::set_var("AZURE_SPEECH_SUBSCRIPTION_KEY", "alias-key");
            env::set_var("OPENAI_API_KEY", "alias-openai");
            env::set_var("OPENAI_API", "primary-openai");
        }

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(
            config.azure_speech_subscription_key.as_deref(),
            Some("alias-key")
        );
        assert_eq!(config.openai_api_key.as_deref(), Some("primary-openai"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_port() {
        cleanup_env_vars();
        unsafe {
            env::set_var("PORT", "not-a-port");
        }

        let result = ServerConfig::from_env();
        assert!(result.unwrap_err().to_string().contains("PORT"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_half_tls_is_rejected() {
        cleanup_env_vars();
        unsafe {
            env::set_var("TLS_CERT_PATH", "/tls/cert.pem");
        }

        assert!(ServerConfig::from_env().is_err());

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_yaml_overrides_env() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        let yaml_content = r#"
server:
  host: "127.0.0.1"
  port: 8080

azure_speech:
  subscription_key: "yaml-key"
  region: "westeurope"
"#;
        fs::write(&config_path, yaml_content).unwrap();

        unsafe {
            env::set_var("HOST", "10.0.0.1");
            env::set_var("SUBSCRIPTION_KEY", "env-key");
            env::set_var("TTS_VOICE", "en-GB-SoniaNeural");
        }

        let config = ServerConfig::from_file(&config_path).unwrap();

        // YAML overrides ENV
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(
            config.azure_speech_subscription_key.as_deref(),
            Some("yaml-key")
        );
        assert_eq!(config.azure_speech_region, "westeurope");
        // ENV fills what YAML leaves out
        assert_eq!(config.tts_voice, "en-GB-SoniaNeural");
        assert_eq!(config.port, 8080);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_missing_file() {
        cleanup_env_vars();

        let result = ServerConfig::from_file(&PathBuf::from("/nonexistent/config.yaml"));
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }

    #[test]
    #[serial]
    fn test_from_file_invalid_yaml() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("invalid.yaml");
        fs::write(&config_path, "invalid: yaml: [content").unwrap();

        let result = ServerConfig::from_file(&config_path);
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse YAML")
        );
    }

    #[test]
    #[serial]
    fn test_from_file_static_dir_and_tls() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let static_dir = temp_dir.path().join("static");
        fs::create_dir(&static_dir).unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        let yaml_content = format!(
            r#"
server:
  static_dir: "{}"
  tls:
    cert_path: "/tls/cert.pem"
    key_path: "/tls/key.pem"
"#,
            static_dir.display()
        );
        fs::write(&config_path, yaml_content).unwrap();

        let config = ServerConfig::from_file(&config_path).unwrap();
        assert_eq!(config.static_dir, Some(static_dir));
        assert!(config.is_tls_enabled());
        assert_eq!(
            config.tls.as_ref().unwrap().key_path,
            PathBuf::from("/tls/key.pem")
        );

        cleanup_env_vars();
    }
}
