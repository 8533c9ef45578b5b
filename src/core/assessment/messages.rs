use serde_json::Value;

use super::AssessmentError;

/// Pull `NBest[0].PronScore` out of a recognition response.
///
/// Newer service versions nest the scores under `PronunciationAssessment`;
/// both shapes are accepted. An absent or empty `NBest` is reported as
/// [`AssessmentError::NoCandidates`].
pub fn extract_pron_score(response: &Value) -> Result<f64, AssessmentError> {
    let no_candidates = || AssessmentError::NoCandidates {
        recognition_status: response
            .get("RecognitionStatus")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
    };

    let best = response
        .get("NBest")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .ok_or_else(no_candidates)?;

    best.get("PronScore")
        .or_else(|| best.pointer("/PronunciationAssessment/PronScore"))
        .and_then(Value::as_f64)
        .ok_or_else(|| {
            AssessmentError::MalformedResponse("NBest[0] has no numeric PronScore".to_string())
        })
}
