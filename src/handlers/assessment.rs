use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
};
use tracing::{info, warn};

use super::form::audio_field;
use crate::core::pipeline::AssessmentReport;
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Multipart field carrying the recording.
pub const AUDIO_FIELD: &str = "audio";

/// Run the full assessment for an uploaded recording.
///
/// Any pipeline failure yields HTTP 500 with `{"error": "..."}`.
pub async fn assess_audio(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<AssessmentReport>> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let audio = audio_field(&mut multipart, AUDIO_FIELD)
        .await?
        .ok_or_else(|| AppError::BadRequest("No audio file provided".to_string()))?;
    if audio.is_empty() {
        return Err(AppError::BadRequest("Uploaded audio is empty".to_string()));
    }

    info!(
        bytes = audio.len(),
        content_type = %audio.content_type,
        file_name = audio.file_name.as_deref().unwrap_or(""),
        "Assessment requested"
    );

    let report = state.pipeline.run(audio).await.inspect_err(|e| {
        warn!(
            stage = %e.stage(),
            configuration = e.is_configuration(),
            "Assessment failed"
        )
    })?;
    Ok(Json(report))
}
