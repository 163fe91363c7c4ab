//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::repository::RepositoryError;
use crate::services::{ConflictDetail, ScheduleError};

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Invalid request (validation error)
    BadRequest(String),
    /// The write collides with stored schedules
    Conflict {
        message: String,
        conflicts: Vec<ConflictDetail>,
    },
    /// An all-or-nothing bulk request failed on one item
    BulkAborted {
        message: String,
        conflicts: Vec<ConflictDetail>,
    },
    /// Internal server error
    Internal(String),
    /// Repository error
    Repository(RepositoryError),
}

fn conflicts_json(conflicts: &[ConflictDetail]) -> Option<String> {
    if conflicts.is_empty() {
        return None;
    }
    serde_json::to_string(conflicts).ok()
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ApiError) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ApiError::new("VALIDATION_ERROR", msg),
            ),
            AppError::Conflict { message, conflicts } => {
                let mut body = ApiError::new("SCHEDULE_CONFLICT", message);
                body.details = conflicts_json(&conflicts);
                (StatusCode::CONFLICT, body)
            }
            AppError::BulkAborted { message, conflicts } => {
                let mut body = ApiError::new("BULK_ABORTED", message);
                body.details = conflicts_json(&conflicts);
                (StatusCode::UNPROCESSABLE_ENTITY, body)
            }
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", msg),
            ),
            AppError::Repository(e) => {
                let msg = e.to_string();
                match e {
                    RepositoryError::NotFound { .. } => {
                        (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg))
                    }
                    RepositoryError::ValidationError { .. } => (
                        StatusCode::BAD_REQUEST,
                        ApiError::new("VALIDATION_ERROR", msg),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiError::new("REPOSITORY_ERROR", msg),
                    ),
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_body();
        if status.is_server_error() {
            tracing::error!("{}: {}", error.code, error.message);
        }
        (status, Json(error)).into_response()
    }
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::Validation(msg) => AppError::BadRequest(msg),
            ScheduleError::NotFound { .. } => AppError::NotFound(err.to_string()),
            ScheduleError::Conflicts(ref conflicts) => AppError::Conflict {
                conflicts: conflicts.clone(),
                message: err.to_string(),
            },
            ScheduleError::BulkAborted { ref source, .. } => AppError::BulkAborted {
                conflicts: source.conflicts().to_vec(),
                message: err.to_string(),
            },
            ScheduleError::Repository(e) => AppError::Repository(e),
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
