use std::path::PathBuf;

use super::{ServerConfig, TlsConfig};

/// TLS needs both a certificate and a key, or neither.
pub fn validate_tls_paths(
    cert_path: Option<PathBuf>,
    key_path: Option<PathBuf>,
) -> Result<Option<TlsConfig>, String> {
    match (cert_path, key_path) {
        (Some(cert_path), Some(key_path)) => Ok(Some(TlsConfig {
            cert_path,
            key_path,
        })),
        (None, None) => Ok(None),
        (Some(_), None) => Err("TLS_CERT_PATH is set but TLS_KEY_PATH is missing".to_string()),
        (None, Some(_)) => Err("TLS_KEY_PATH is set but TLS_CERT_PATH is missing".to_string()),
    }
}

/// Checks that do not depend on credentials being present.
///
/// Missing keys are tolerated here; the affected route reports them when used.
pub fn validate_server_config(config: &ServerConfig) -> Result<(), String> {
    if config.port == 0 {
        return Err("PORT must be non-zero".to_string());
    }
    if config.azure_speech_region.trim().is_empty() {
        return Err("AZURE_SPEECH_REGION must not be empty".to_string());
    }
    if config.rate_limit_requests_per_second == 0 {
        return Err("RATE_LIMIT_REQUESTS_PER_SECOND must be greater than 0".to_string());
    }
    if config.rate_limit_burst_size == 0 {
        return Err("RATE_LIMIT_BURST_SIZE must be greater than 0".to_string());
    }
    if config.max_upload_bytes == 0 {
        return Err("MAX_UPLOAD_BYTES must be greater than 0".to_string());
    }
    if config.upstream_timeout_seconds == Some(0) {
        return Err("UPSTREAM_TIMEOUT_SECONDS must be greater than 0 when set".to_string());
    }
    if let Some(dir) = &config.static_dir
        && !dir.is_dir()
    {
        return Err(format!(
            "STATIC_DIR '{}' is not a directory",
            dir.display()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_paths_both_or_neither() {
        assert!(validate_tls_paths(None, None).unwrap().is_none());
        let tls = validate_tls_paths(Some("c.pem".into()), Some("k.pem".into()))
            .unwrap()
            .unwrap();
        assert_eq!(tls.cert_path, PathBuf::from("c.pem"));
        assert!(
            validate_tls_paths(Some("c.pem".into()), None)
                .unwrap_err()
                .contains("TLS_KEY_PATH")
        );
        assert!(
            validate_tls_paths(None, Some("k.pem".into()))
                .unwrap_err()
                .contains("TLS_CERT_PATH")
        );
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_server_config(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_zero_port() {
        let mut config = ServerConfig::default();
        config.port = 0;
        assert!(validate_server_config(&config).unwrap_err().contains("PORT"));
    }

    #[test]
    fn test_rejects_blank_region() {
        let mut config = ServerConfig::default();
        config.azure_speech_region = " ".to_string();
        assert!(
            validate_server_config(&config)
                .unwrap_err()
                .contains("AZURE_SPEECH_REGION")
        );
    }

    #[test]
    fn test_rejects_zero_rate_limits() {
        let mut config = ServerConfig::default();
        config.rate_limit_burst_size = 0;
        assert!(validate_server_config(&config).is_err());

        let mut config = ServerConfig::default();
        config.rate_limit_requests_per_second = 0;
        assert!(validate_server_config(&config).is_err());
    }

    #[test]
    fn test_rejects_missing_static_dir() {
        let mut config = ServerConfig::default();
        config.static_dir = Some(PathBuf::from("/nonexistent/static/dir"));
        assert!(validate_server_config(&config).unwrap_err().contains("STATIC_DIR"));
    }
}
