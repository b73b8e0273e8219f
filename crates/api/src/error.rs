//! API error taxonomy and HTTP mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use edit_engine::EngineError;
use protocol::ErrorBody;
use thiserror::Error;

/// Errors reported to HTTP callers
///
/// Every variant carries a human-readable detail string; the category decides
/// the status code. Validation and readiness failures are fully recovered
/// here; the process stays up for the next request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed, empty or out-of-range request fields; never retried
    #[error("{0}")]
    InvalidArgument(String),

    /// The model has not finished loading; callers should retry after backoff
    #[error("{0}")]
    NotReady(String),

    /// Unexpected failure inside the transformation path
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::InvalidArgument(detail) => (StatusCode::BAD_REQUEST, detail),
            ApiError::NotReady(detail) => (StatusCode::SERVICE_UNAVAILABLE, detail),
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "internal error in edit path");
                (StatusCode::INTERNAL_SERVER_ERROR, detail)
            }
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::NotLoaded => {
                ApiError::NotReady("Model not loaded. Please retry shortly.".to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}
