use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Embedding service error: {0}")]
    Embedding(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Job queue error: {0}")]
    Queue(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Embedding(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Cache(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Queue(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Whether the caller can reasonably retry the same request.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Validation(_) => false,
            ApiError::NotFound(_) => false,
            ApiError::Conflict(_) => false,
            ApiError::Database(_) => true,
            ApiError::Embedding(_) => true,
            ApiError::Cache(_) => true,
            ApiError::Queue(_) => true,
        }
    }

    /// Classify a low-level database failure, surfacing unique-constraint
    /// violations as conflicts.
    pub fn from_database(err: anyhow::Error) -> Self {
        let text = format!("{:#}", err);
        if text.contains("duplicate key") || text.contains("unique constraint") {
            ApiError::Conflict(text)
        } else {
            ApiError::Database(text)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }

        let body = Json(json!({
            "error": self.to_string(),
            "retryable": self.is_retryable(),
        }));

        (status, body).into_response()
    }
}
