//! HTTP error mapping for API handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reportd_core::AppError;
use serde_json::json;

/// Wrapper that renders [`AppError`] as a JSON error response.
#[derive(Debug)]
pub struct HttpError(pub AppError);

impl From<AppError> for HttpError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl HttpError {
    /// Status code this error maps to.
    pub fn status(&self) -> StatusCode {
        match self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Io(_) | AppError::StorageMessage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self.0 {
            AppError::Validation(message) => json!({ "error": message }),
            AppError::Conflict { message, keys } | AppError::NotFound { message, keys } => {
                json!({ "error": message, "keys": keys })
            }
            AppError::Io(err) => {
                tracing::error!("Storage I/O error: {}", err);
                json!({ "error": "Storage operation failed" })
            }
            AppError::StorageMessage(message) => {
                tracing::error!("Internal error: {}", message);
                json!({ "error": "Internal server error" })
            }
        };
        (status, Json(body)).into_response()
    }
}
