//! Server error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::tasks::TaskStoreError;

/// Errors that can occur while running the dashboard server.
#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    /// Failed to bind to address.
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Server error.
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error returned to API clients as JSON.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Path not found")]
    PathNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Invalid request path")]
    InvalidPath,

    #[error("Internal error")]
    Internal(String),
}

impl From<TaskStoreError> for ApiError {
    fn from(err: TaskStoreError) -> Self {
        match err {
            TaskStoreError::NotFound(id) => ApiError::TaskNotFound(id),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, details) = match &self {
            ApiError::PathNotFound(details) => (StatusCode::NOT_FOUND, Some(details.clone())),
            ApiError::TaskNotFound(_) => (StatusCode::NOT_FOUND, None),
            ApiError::InvalidPath => (StatusCode::BAD_REQUEST, None),
            ApiError::Internal(details) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Some(details.clone()))
            }
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "details": details,
        });
        (code, Json(body)).into_response()
    }
}
