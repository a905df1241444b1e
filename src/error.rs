//! Error types for the REST API.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::provider::ProviderError;

#[cfg(test)]
mod tests;

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
    /// Error code.
    pub code: String,
}

/// API error types.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed ticker, date, interval, or contract type.
    #[error("Invalid format: {0}")]
    Format(String),

    /// Start date not strictly before end date.
    #[error("Invalid date range: {0}")]
    RangeInvalid(String),

    /// Query span exceeds a hard cap.
    #[error("Date range too large: {0}")]
    RangeTooLarge(String),

    /// The maths solver found no root for the requested quantity.
    #[error("No solution found for {0}")]
    NoSolution(String),

    /// Upstream gateway failure.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Format(_) => (StatusCode::BAD_REQUEST, "INVALID_FORMAT"),
            ApiError::RangeInvalid(_) => (StatusCode::BAD_REQUEST, "RANGE_INVALID"),
            ApiError::RangeTooLarge(_) => (StatusCode::BAD_REQUEST, "RANGE_TOO_LARGE"),
            ApiError::NoSolution(_) => (StatusCode::BAD_REQUEST, "NO_SOLUTION"),
            ApiError::Provider(_) => (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        ApiError::Provider(err.to_string())
    }
}
