use serde::Deserialize;
use std::path::PathBuf;

/// YAML configuration file layout.
///
/// Every field is optional; anything left out falls back to the environment
/// and then to built-in defaults.
///
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 5000
///   static_dir: "./static"
///   max_upload_bytes: 26214400
///   upstream_timeout_seconds: 60
///   tls:
///     cert_path: "/etc/tls/cert.pem"
///     key_path: "/etc/tls/key.pem"
///
/// azure_speech:
///   subscription_key: "your-speech-key"
///   region: "southeastasia"
///   language: "en-US"
///   voice: "en-US-JennyNeural"
///
/// whisper:
///   url: "https://my-resource.openai.azure.com/openai/deployments/whisper/audio/transcriptions?api-version=2024-06-01"
///   api_key: "your-whisper-key"
///
/// openai:
///   endpoint: "https://my-resource.openai.azure.com/"
///   api_key: "your-openai-key"
///   deployment: "gpt-4o"
///   api_version: "2023-03-15-preview"
///
/// security:
///   cors_allowed_origins: "*"
///   rate_limit_requests_per_second: 60
///   rate_limit_burst_size: 10
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub azure_speech: Option<AzureSpeechYaml>,
    pub whisper: Option<WhisperYaml>,
    pub openai: Option<OpenAIYaml>,
    pub security: Option<SecurityYaml>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls: Option<TlsYaml>,
    pub static_dir: Option<String>,
    pub max_upload_bytes: Option<usize>,
    pub upstream_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsYaml {
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

/// Azure Speech resource settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AzureSpeechYaml {
    pub subscription_key: Option<String>,
    pub region: Option<String>,
    pub language: Option<String>,
    pub voice: Option<String>,
    /// Endpoint overrides, mainly for proxies
    pub token_url: Option<String>,
    pub stt_url: Option<String>,
    pub tts_url: Option<String>,
    pub tts_ws_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct WhisperYaml {
    pub url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct OpenAIYaml {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub deployment: Option<String>,
    pub api_version: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    pub cors_allowed_origins: Option<String>,
    pub rate_limit_requests_per_second: Option<u32>,
    pub rate_limit_burst_size: Option<u32>,
}

impl YamlConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_yaml_config_full() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 8080
  static_dir: "./static"
  max_upload_bytes: 1048576
  upstream_timeout_seconds: 30
  tls:
    cert_path: "/tls/cert.pem"
    key_path: "/tls/key.pem"

azure_speech:
  subscription_key: "speech-key"
  region: "westeurope"
  language: "en-GB"
  voice: "en-GB-SoniaNeural"
  tts_ws_url: "wss://proxy.example.com/tts"

whisper:
  url: "https://res.openai.azure.com/openai/deployments/whisper/audio/transcriptions?api-version=2024-06-01"
  api_key: "whisper-key"

openai:
  endpoint: "https://res.openai.azure.com/"
  api_key: "openai-key"
  deployment: "gpt-4o-mini"

security:
  cors_allowed_origins: "https://app.example.com"
  rate_limit_requests_per_second: 5
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();

        let server = config.server.unwrap();
        assert_eq!(server.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(server.port, Some(8080));
        assert_eq!(server.max_upload_bytes, Some(1_048_576));
        assert_eq!(server.tls.unwrap().key_path.as_deref(), Some("/tls/key.pem"));

        let speech = config.azure_speech.unwrap();
        assert_eq!(speech.region.as_deref(), Some("westeurope"));
        assert_eq!(speech.voice.as_deref(), Some("en-GB-SoniaNeural"));
        assert_eq!(speech.tts_ws_url.as_deref(), Some("wss://proxy.example.com/tts"));
        assert!(speech.token_url.is_none());

        assert_eq!(config.whisper.unwrap().api_key.as_deref(), Some("whisper-key"));
        let openai = config.openai.unwrap();
        assert_eq!(openai.deployment.as_deref(), Some("gpt-4o-mini"));
        assert!(openai.api_version.is_none());

        let security = config.security.unwrap();
        assert_eq!(security.rate_limit_requests_per_second, Some(5));
        assert!(security.rate_limit_burst_size.is_none());
    }

    #[test]
    fn test_yaml_config_empty() {
        let config: YamlConfig = serde_yaml::from_str("{}").unwrap();
        assert!(config.server.is_none());
        assert!(config.azure_speech.is_none());
        assert!(config.openai.is_none());
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "server:\n  host: \"localhost\"\n  port: 3000\n").unwrap();

        let config = YamlConfig::from_file(&config_path).unwrap();
        let server = config.server.unwrap();
        assert_eq!(server.host.as_deref(), Some("localhost"));
        assert_eq!(server.port, Some(3000));
    }

    #[test]
    fn test_from_file_not_found() {
        let path = PathBuf::from("/nonexistent/config.yaml");
        let result = YamlConfig::from_file(&path);
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }

    #[test]
    fn test_from_file_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("invalid.yaml");
        fs::write(&config_path, "invalid: yaml: content:").unwrap();

        let result = YamlConfig::from_file(&config_path);
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse YAML")
        );
    }
}
