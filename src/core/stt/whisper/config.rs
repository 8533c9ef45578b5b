use url::Url;

/// File name reported for the uploaded multipart part.
pub const UPLOAD_FILE_NAME: &str = "audio_wh.wav";

/// Connection settings for a Whisper deployment.
#[derive(Debug, Clone, Default)]
pub struct WhisperConfig {
    /// Full transcription URL, including deployment and `api-version`.
    pub url: String,
    /// Value for the `api-key` header.
    pub api_key: String,
}

impl WhisperConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.url.trim().is_empty() {
            return Err("WHISPER_URL is not set".to_string());
        }
        Url::parse(&self.url).map_err(|e| format!("WHISPER_URL is not a valid URL: {e}"))?;
        if self.api_key.trim().is_empty() {
            return Err("WHISPER_API_KEY is not set".to_string());
        }
        Ok(())
    }
}
