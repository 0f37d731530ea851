//! Reusable OpenAPI response types.

use super::ErrorResponse;
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToResponse;

#[derive(ToResponse)]
#[response(
    description = "Internal Server Error",
    content_type = "application/json",
    example = json!({
        "success": false,
        "message": "An internal server error occurred",
        "error": "INTERNAL_ERROR",
        "code": 1005
    })
)]
pub struct InternalServerErrorResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Bad Request - Validation Error",
    content_type = "application/json",
    example = json!({
        "success": false,
        "message": "Validation error",
        "error": "VALIDATION_ERROR",
        "code": 1001,
        "errors": [
            { "field": "title", "message": "Task title is required" },
            { "field": "dueDate", "message": "Due date cannot be in the past" }
        ]
    })
)]
pub struct BadRequestValidationResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Bad Request - Malformed identifier",
    content_type = "application/json",
    example = json!({
        "success": false,
        "message": "Invalid ID format",
        "error": "INVALID_ID",
        "code": 1002
    })
)]
pub struct BadRequestInvalidIdResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Resource not found",
    content_type = "application/json",
    example = json!({
        "success": false,
        "message": "Task not found",
        "error": "NOT_FOUND",
        "code": 1004
    })
)]
pub struct NotFoundResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Unauthorized - Authentication required",
    content_type = "application/json",
    example = json!({
        "success": false,
        "message": "Access token required",
        "error": "UNAUTHORIZED",
        "code": 1006
    })
)]
pub struct UnauthorizedResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Conflict - Concurrent modification",
    content_type = "application/json",
    example = json!({
        "success": false,
        "message": "Task was modified by another request, please retry",
        "error": "CONFLICT",
        "code": 1008
    })
)]
pub struct ConflictResponse(pub ErrorResponse);
