//! The success envelope shared by every endpoint.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// `{ success, message, data? }`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Pairs the envelope with a status other than 200.
    pub fn with_status(self, status: StatusCode) -> (StatusCode, Self) {
        (status, self)
    }
}

impl ApiResponse<()> {
    /// Envelope without a payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Documents a payload-less success envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_with_data() {
        let body = serde_json::to_value(ApiResponse::ok("Done", json!({ "n": 1 }))).unwrap();
        assert_eq!(body, json!({ "success": true, "message": "Done", "data": { "n": 1 } }));
    }

    #[test]
    fn test_envelope_without_data_omits_key() {
        let body = serde_json::to_value(ApiResponse::message("Task deleted successfully")).unwrap();
        assert_eq!(body, json!({ "success": true, "message": "Task deleted successfully" }));
    }

    #[test]
    fn test_with_status() {
        let (status, _) = ApiResponse::ok("Created", 1).with_status(StatusCode::CREATED);
        assert_eq!(status, StatusCode::CREATED);
    }
}
