//! API error types and handling.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use refinery::RefineryError;
use serde::Serialize;

/// API error type.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from client.
    BadRequest(String),
    /// Error from the engine.
    Engine(RefineryError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Engine(e) => {
                let (status, error) = match &e {
                    RefineryError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                    RefineryError::DuplicateFunctionOnColumn { .. } => {
                        (StatusCode::CONFLICT, "duplicate_function")
                    }
                    RefineryError::IncompleteReorderSet { .. } => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "incomplete_reorder")
                    }
                    RefineryError::InvalidUpdate(_) => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "invalid_update")
                    }
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
                };
                (status, error, e.to_string())
            }
        };

        if status.is_server_error() {
            tracing::error!(%message, "request failed");
        }

        (
            status,
            Json(ErrorResponse {
                error: error.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

impl From<RefineryError> for ApiError {
    fn from(err: RefineryError) -> Self {
        ApiError::Engine(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Engine(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ApiError {}
