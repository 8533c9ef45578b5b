use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use url::Url;

/// Parameters sent in the `Pronunciation-Assessment` header.
///
/// Field order is significant: the JSON is emitted in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssessmentConfig {
    pub reference_text: String,
    pub grading_system: &'static str,
    pub dimension: &'static str,
    pub enable_miscue: bool,
}

impl AssessmentConfig {
    pub fn new(reference_text: impl Into<String>) -> Self {
        Self {
            reference_text: reference_text.into(),
            grading_system: "HundredMark",
            dimension: "Comprehensive",
            enable_miscue: true,
        }
    }

    pub fn to_json(&self) -> String {
        // Serializing plain strings and a bool cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Standard base64 of the JSON, ready for the request header.
    pub fn header_value(&self) -> String {
        STANDARD.encode(self.to_json())
    }
}

/// Where and how to reach the recognition endpoint.
#[derive(Debug, Clone, Default)]
pub struct AzureAssessmentEndpoint {
    pub subscription_key: String,
    /// Base recognition URL without query parameters.
    pub url: String,
    pub language: String,
}

impl AzureAssessmentEndpoint {
    /// Regional short-audio recognition endpoint.
    pub fn regional_url(region: &str) -> String {
        format!(
            "https://{region}.stt.speech.microsoft.com/speech/recognition/conversation/cognitiveservices/v1"
        )
    }

    pub fn request_url(&self) -> Result<Url, String> {
        if self.subscription_key.trim().is_empty() {
            return Err("SUBSCRIPTION_KEY is not set".to_string());
        }
        let mut url = Url::parse(&self.url)
            .map_err(|e| format!("Invalid recognition URL '{}': {e}", self.url))?;
        url.query_pairs_mut()
            .append_pair("language", &self.language)
            .append_pair("usePipelineVersion", "0");
        Ok(url)
    }
}
