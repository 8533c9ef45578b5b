use std::sync::Arc;

use axum::{Json, extract::State};
use serde_json::{Value, json};
use tracing::info;

use crate::errors::AppResult;
use crate::state::AppState;

/// Issue a short-lived speech token: `{"at": "<token>"}`.
pub async fn get_token(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    let token = state.token_issuer.issue_token().await?;
    info!("Speech token issued");
    Ok(Json(json!({ "at": token })))
}
