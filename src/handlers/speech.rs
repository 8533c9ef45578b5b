use std::sync::Arc;

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde_json::json;
use tracing::{info, warn};

use super::form::text_field;
use crate::state::AppState;

/// Response header carrying word-boundary offsets as a JSON array of ms.
pub const OFFSETS_HEADER: &str = "offsets";

fn synthesis_failed() -> Response {
    Json(json!({ "success": false })).into_response()
}

fn wav_response(audio: Bytes, offsets: Option<&[f64]>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/wav"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=sound.wav"),
    );

    if let Some(offsets) = offsets {
        match serde_json::to_string(offsets)
            .ok()
            .and_then(|encoded| HeaderValue::from_str(&encoded).ok())
        {
            Some(value) => {
                headers.insert(HeaderName::from_static(OFFSETS_HEADER), value);
            }
            None => warn!("Could not encode word offsets header"),
        }
    }

    (StatusCode::OK, headers, audio).into_response()
}

/// Read `field` and reject blank text.
async fn requested_text(request: Request, field: &str) -> Result<Option<String>, Response> {
    let text = text_field(request, field)
        .await
        .map_err(IntoResponse::into_response)?;
    Ok(text.filter(|text| !text.trim().is_empty()))
}

/// Synthesize the `reftext` sentence with word-boundary offsets.
pub async fn get_tts(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let text = match requested_text(request, "reftext").await {
        Ok(Some(text)) => text,
        Ok(None) => {
            warn!("Synthesis requested without reftext");
            return synthesis_failed();
        }
        Err(response) => return response,
    };

    match state.synthesizer.synthesize_with_word_boundaries(&text).await {
        Ok(output) => {
            info!(
                bytes = output.audio.len(),
                words = output.word_offsets_ms.len(),
                "Sentence synthesized"
            );
            wav_response(output.audio, Some(&output.word_offsets_ms))
        }
        Err(e) => {
            warn!("Speech synthesis canceled: {}", e);
            synthesis_failed()
        }
    }
}

/// Synthesize a single `word`.
pub async fn get_tts_for_word(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let word = match requested_text(request, "word").await {
        Ok(Some(word)) => word,
        Ok(None) => {
            warn!("Synthesis requested without word");
            return synthesis_failed();
        }
        Err(response) => return response,
    };

    match state.synthesizer.synthesize(&word).await {
        Ok(audio) => wav_response(audio, None),
        Err(e) => {
            warn!("Speech synthesis canceled: {}", e);
            synthesis_failed()
        }
    }
}
