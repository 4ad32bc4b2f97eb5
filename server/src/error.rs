use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use todo_core::ValidationError;

use crate::store::StoreError;

/// Failures surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Lookup of a single record missed.
    #[error("Not found")]
    NotFound,

    /// Update, patch or delete targeted a missing record.
    #[error("Todo not found")]
    TodoNotFound,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
            }
            AppError::TodoNotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "Todo not found" })),
            )
                .into_response(),
            AppError::Validation(e) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response()
            }
            AppError::Store(e) => {
                // details stay in the log
                tracing::error!(error = %e, "store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
