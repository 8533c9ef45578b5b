use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::core::pipeline::PipelineError;
use crate::core::token::TokenError;

/// Errors surfaced by HTTP handlers, rendered as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Token(TokenError::Upstream { .. } | TokenError::Network(_)) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Token(TokenError::Configuration(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            error!(status = status.as_u16(), "Request failed: {}", message);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
