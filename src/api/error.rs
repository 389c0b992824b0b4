//! HTTP rendering of feed errors.

use crate::error::FeedError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl FeedError {
    /// HTTP status and machine-readable code for this error
    #[must_use]
    pub const fn status(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Configuration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR"),
            Self::Storage(_) | Self::Serialization(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR")
            }
            Self::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
        }
    }
}

impl IntoResponse for FeedError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        let message = match &self {
            // Backend details stay in the log
            Self::Storage(_) | Self::Serialization(_) => {
                error!("Request failed: {self}");
                "internal storage error".to_string()
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            error: message,
            code,
        };
        (status, Json(body)).into_response()
    }
}
