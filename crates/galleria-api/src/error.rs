//! API error types and JSON error response formatting.
//!
//! ApiError maps internal errors to HTTP status codes and the `{"error": …}`
//! body the front end expects. Storage and collaborator failures keep their
//! detail server-side; clients only see a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use galleria_core::error::GalleriaError;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid parameters.
    BadRequest(String),
    /// 404 Not Found - resource does not exist.
    NotFound(String),
    /// 500 Internal Server Error - detail is logged, not sent.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(detail) => {
                error!("Request failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Could not process your request.".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<GalleriaError> for ApiError {
    fn from(err: GalleriaError) -> Self {
        match err {
            GalleriaError::InvalidIdentifier(msg) | GalleriaError::InvalidArgument(msg) => {
                ApiError::BadRequest(msg)
            }
            GalleriaError::NotFound(msg) => ApiError::NotFound(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<galleria_chat::ChatError> for ApiError {
    fn from(err: galleria_chat::ChatError) -> Self {
        ApiError::from(GalleriaError::from(err))
    }
}
