//! API Error Types
//!
//! Graphite clients expect failures as bare status codes, so errors are
//! logged server-side and answered with an empty body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// A request parameter could not be parsed
    #[error("Invalid {field}: {message}")]
    BadRequest {
        field: &'static str,
        message: String,
    },

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Bad request for `field` caused by `err`
    pub fn bad_request(field: &'static str, err: impl std::fmt::Display) -> Self {
        ApiError::BadRequest {
            field,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::new_v4().to_string();

        let status = match &self {
            ApiError::BadRequest { field, .. } => {
                tracing::warn!(
                    request_id = %request_id,
                    field = %field,
                    error_message = %self,
                    "Rejected malformed request"
                );
                StatusCode::BAD_REQUEST
            }
            ApiError::Internal(_) | ApiError::Io(_) => {
                tracing::error!(
                    request_id = %request_id,
                    error_message = %self,
                    "API error occurred"
                );
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        status.into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
