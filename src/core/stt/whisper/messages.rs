use serde::Deserialize;

/// Whisper transcription response. Only `text` is interpreted.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionResponse {
    #[serde(default)]
    pub text: String,
}

/// Error envelope returned by Azure OpenAI.
#[derive(Debug, Clone, Deserialize)]
pub struct AzureErrorResponse {
    pub error: AzureError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AzureError {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}
