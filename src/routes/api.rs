use axum::{Router, routing::post};
use tower_http::trace::TraceLayer;

use crate::handlers::{assessment, speech, token};
use crate::state::AppState;
use std::sync::Arc;

/// Create the API router used by the browser client.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/gettoken", post(token::get_token))
        .route("/ackaud", post(assessment::assess_audio))
        .route("/gettts", post(speech::get_tts))
        .route("/getttsforword", post(speech::get_tts_for_word))
        .layer(TraceLayer::new_for_http())
}
