//! Error types for the dashboard API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::DatabaseError;
use thiserror::Error;

/// Errors that can occur in the dashboard API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Database error.
    #[error("{0}")]
    Database(#[from] DatabaseError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ApiError::Database(err) = &self;

        let status = match err {
            DatabaseError::Validation(_) => StatusCode::BAD_REQUEST,
            DatabaseError::NotFound { .. } => StatusCode::NOT_FOUND,
            DatabaseError::AlreadyExists { .. } | DatabaseError::Constraint(_) => {
                StatusCode::CONFLICT
            }
            DatabaseError::Busy => StatusCode::SERVICE_UNAVAILABLE,
            DatabaseError::Sqlx(_) | DatabaseError::Migration(_) => {
                tracing::error!("Database error: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = serde_json::json!({
            "error": {
                "kind": err.kind(),
                "message": err.to_string(),
            }
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for dashboard API handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
