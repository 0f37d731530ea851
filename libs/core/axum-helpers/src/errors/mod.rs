pub mod codes;
pub mod handlers;
pub mod responses;

pub use codes::ErrorCode;

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Flattens `validator` output into violations ordered by field name.
    pub fn from_validation_errors(errors: &ValidationErrors) -> Vec<Self> {
        let mut violations: Vec<Self> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |err| {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{field} is invalid ({})", err.code));
                    Self::new(field.to_string(), message)
                })
            })
            .collect();
        violations.sort_by(|a, b| a.field.cmp(&b.field));
        violations
    }
}

/// Error envelope returned by every failing endpoint.
///
/// ```json
/// {
///   "success": false,
///   "message": "Validation error",
///   "error": "VALIDATION_ERROR",
///   "code": 1001,
///   "errors": [{ "field": "title", "message": "Task title is required" }]
/// }
/// ```
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    pub message: String,
    /// Machine-readable identifier
    pub error: String,
    /// Integer code for logs and monitoring
    pub code: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldViolation>>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: code.as_str().to_string(),
            code: code.code(),
            errors: None,
        }
    }

    pub fn with_violations(mut self, violations: Vec<FieldViolation>) -> Self {
        self.errors = Some(violations);
        self
    }
}

/// Application error type rendered as an [`ErrorResponse`].
///
/// Domain errors convert into this at the HTTP boundary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(JsonRejection),

    #[error("Query extraction error: {0}")]
    QueryExtractorRejection(#[from] QueryRejection),

    #[error("Validation error: {} violation(s)", .0.len())]
    Validation(Vec<FieldViolation>),

    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::JsonExtractorRejection(_)
            | AppError::QueryExtractorRejection(_)
            | AppError::Validation(_)
            | AppError::InvalidId(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn error_code(&self) -> ErrorCode {
        match self {
            AppError::JsonExtractorRejection(_) => ErrorCode::JsonExtraction,
            AppError::QueryExtractorRejection(_) | AppError::BadRequest(_) => {
                ErrorCode::BadRequest
            }
            AppError::Validation(_) => ErrorCode::ValidationError,
            AppError::InvalidId(_) => ErrorCode::InvalidId,
            AppError::Unauthorized(_) => ErrorCode::Unauthorized,
            AppError::Forbidden(_) => ErrorCode::Forbidden,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::Conflict(_) => ErrorCode::Conflict,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::InternalServerError(_) => ErrorCode::InternalError,
            AppError::ServiceUnavailable(_) => ErrorCode::ServiceUnavailable,
        }
    }

    fn into_body(self) -> ErrorResponse {
        let code = self.error_code();
        match self {
            AppError::JsonExtractorRejection(e) => ErrorResponse::new(code, e.body_text()),
            AppError::QueryExtractorRejection(e) => ErrorResponse::new(code, e.body_text()),
            AppError::Validation(violations) => {
                ErrorResponse::new(code, code.default_message()).with_violations(violations)
            }
            // Internal details stay in the logs.
            AppError::Database(_) | AppError::InternalServerError(_) => {
                ErrorResponse::new(code, code.default_message())
            }
            AppError::InvalidId(msg)
            | AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::ServiceUnavailable(msg) => ErrorResponse::new(code, msg),
        }
    }
}

/// Prefix axum puts before the serde error of a well-formed body whose
/// values have the wrong type.
const JSON_DATA_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

/// Reads `path: problem` out of a JSON data rejection.
fn json_data_violation(text: &str) -> FieldViolation {
    let detail = text.strip_prefix(JSON_DATA_PREFIX).unwrap_or(text);
    match detail.split_once(": ") {
        Some((path, problem)) if !path.is_empty() && !path.contains(' ') => {
            FieldViolation::new(path, problem)
        }
        _ => FieldViolation::new("body", detail),
    }
}

impl From<JsonRejection> for AppError {
    /// Type mismatches become field violations. Syntax errors, a missing
    /// content type and oversized bodies stay plain bad requests.
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => {
                AppError::Validation(vec![json_data_violation(&e.body_text())])
            }
            other => AppError::JsonExtractorRejection(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_code = self.error_code();

        if status.is_server_error() {
            tracing::error!(
                error_code = error_code.code(),
                status = status.as_u16(),
                error = %self,
                "Request failed"
            );
        } else {
            tracing::warn!(
                error_code = error_code.code(),
                status = status.as_u16(),
                error = %self,
                "Request rejected"
            );
        }

        (status, Json(self.into_body())).into_response()
    }
}

/// Builds an error response without going through [`AppError`].
pub fn error_response(status: StatusCode, message: String, error_code: ErrorCode) -> Response {
    (status, Json(ErrorResponse::new(error_code, message))).into_response()
}
