use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, FieldViolation};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid task: {} violation(s)", .0.len())]
    Validation(Vec<FieldViolation>),

    #[error("Task {0} kept changing during the update")]
    Conflict(Uuid),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type TaskResult<T> = Result<T, TaskError>;

impl From<TaskError> for AppError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::NotFound(_) => AppError::NotFound("Task not found".to_string()),
            TaskError::Validation(violations) => AppError::Validation(violations),
            TaskError::Conflict(_) => AppError::Conflict(
                "Task was modified by another request, please retry".to_string(),
            ),
            TaskError::Database(msg) => AppError::Database(msg),
            TaskError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for TaskError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for TaskError {
    fn from(err: mongodb::error::Error) -> Self {
        TaskError::Database(err.to_string())
    }
}
