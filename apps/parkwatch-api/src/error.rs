//! Error types for the parkwatch API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Plate {0} is not registered to any resident")]
    NotOwned(String),

    #[error("A report for plate {0} was already filed today")]
    DuplicateReport(String),

    /// Covers both a missing record and someone else's record, so a
    /// requester cannot probe which ids exist.
    #[error("Record not found or no permission")]
    NotFoundOrForbidden,

    #[error("Missing or unknown reporter identity")]
    Unauthorized,

    #[error("Photo storage error: {0}")]
    PhotoStorage(#[source] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION", msg.clone()),
            ApiError::NotOwned(_) => (StatusCode::BAD_REQUEST, "NOT_OWNED", self.to_string()),
            ApiError::DuplicateReport(_) => {
                (StatusCode::CONFLICT, "DUPLICATE_REPORT", self.to_string())
            }
            ApiError::NotFoundOrForbidden => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string())
            }
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string()),
            ApiError::PhotoStorage(e) => {
                tracing::error!("Photo storage error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "Photo storage error".to_string(),
                )
            }
            ApiError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database error".to_string(),
                )
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal error".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
