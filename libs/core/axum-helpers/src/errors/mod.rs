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
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Body of every error response.
///
/// ```json
/// { "code": 1004, "error": "NOT_FOUND", "message": "Event not found", "details": null }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Integer code for log correlation
    pub code: i32,
    /// Machine-readable error name
    pub error: String,
    /// Human-readable message
    pub message: String,
    /// Field-level validation errors, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            error: code.as_str().to_string(),
            message: message.into(),
            details: None,
        }
    }
}

/// Application error; the only type handlers return on failure.
///
/// Domain errors convert into this with `From`, and `IntoResponse` maps each
/// variant to a status code:
/// `BadRequest`/validation/extraction → 400, `NotFound` → 404,
/// `InternalServerError` and infrastructure errors → 500.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Invalid ID: {0}")]
    InvalidId(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Query extraction error: {0}")]
    QueryExtractorRejection(#[from] QueryRejection),

    #[error("JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_)
            | AppError::InvalidId(_)
            | AppError::ValidationError(_)
            | AppError::JsonExtractorRejection(_)
            | AppError::QueryExtractorRejection(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InternalServerError(_) | AppError::SerdeJson(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_code(&self) -> ErrorCode {
        match self {
            AppError::BadRequest(_) => ErrorCode::BadRequest,
            AppError::InvalidId(_) => ErrorCode::InvalidId,
            AppError::Unauthorized(_) => ErrorCode::Unauthorized,
            AppError::Forbidden(_) => ErrorCode::Forbidden,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::Conflict(_) => ErrorCode::Conflict,
            AppError::InternalServerError(_) => ErrorCode::InternalError,
            AppError::ServiceUnavailable(_) => ErrorCode::ServiceUnavailable,
            AppError::ValidationError(_) => ErrorCode::ValidationError,
            AppError::JsonExtractorRejection(_) => ErrorCode::JsonExtraction,
            AppError::QueryExtractorRejection(_) => ErrorCode::QueryExtraction,
            AppError::SerdeJson(_) => ErrorCode::SerdeJsonError,
            AppError::Io(_) => ErrorCode::IoError,
        }
    }

    fn log(&self, code: ErrorCode) {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error_code = code.code(), status = status.as_u16(), error = %self, "request failed");
        } else if matches!(code, ErrorCode::Unauthorized | ErrorCode::Forbidden) {
            tracing::warn!(error_code = code.code(), status = status.as_u16(), error = %self, "request rejected");
        } else {
            tracing::info!(error_code = code.code(), status = status.as_u16(), error = %self, "request rejected");
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.error_code();
        self.log(code);
        let status = self.status();

        let (message, details) = match self {
            AppError::BadRequest(msg)
            | AppError::InvalidId(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::InternalServerError(msg)
            | AppError::ServiceUnavailable(msg) => (msg, None),
            AppError::ValidationError(e) => (
                first_validation_message(&e).unwrap_or_else(|| code.default_message().to_string()),
                serde_json::to_value(&e).ok(),
            ),
            AppError::JsonExtractorRejection(e) => (e.body_text(), None),
            AppError::QueryExtractorRejection(e) => (e.body_text(), None),
            AppError::SerdeJson(_) | AppError::Io(_) => (code.default_message().to_string(), None),
        };

        let body = ErrorResponse {
            code: code.code(),
            error: code.as_str().to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Message of the first failing rule that carries one, in field order.
fn first_validation_message(errors: &ValidationErrors) -> Option<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields
        .into_iter()
        .flat_map(|(_, errs)| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
}

/// Build an error response outside of `AppError`, e.g. from middleware.
pub fn error_response(status: StatusCode, message: impl Into<String>, code: ErrorCode) -> Response {
    (status, Json(ErrorResponse::new(code, message))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn into_parts(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_bad_request_keeps_message() {
        let (status, body) =
            into_parts(AppError::BadRequest("Email already in use".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Email already in use");
        assert_eq!(body["error"], "BAD_REQUEST");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_not_found_is_404() {
        let (status, body) = into_parts(AppError::NotFound("Event not found".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 1004);
    }

    #[tokio::test]
    async fn test_invalid_id_is_400() {
        let (status, body) = into_parts(AppError::InvalidId("Invalid ID format".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "INVALID_ID");
    }

    #[tokio::test]
    async fn test_internal_error_is_500_with_message() {
        let (status, body) =
            into_parts(AppError::InternalServerError("Failed to fetch coordinates".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Failed to fetch coordinates");
    }

    #[tokio::test]
    async fn test_unclassified_errors_are_generic_500() {
        let io = std::io::Error::other("disk on fire at /var/lib/uploads");
        let (status, body) = into_parts(AppError::Io(io)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "An internal server error occurred");
    }

    #[tokio::test]
    async fn test_validation_errors_carry_details() {
        let mut errors = ValidationErrors::new();
        errors.add("name", validator::ValidationError::new("length"));
        let (status, body) = into_parts(AppError::ValidationError(errors)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Request validation failed");
        assert!(body["details"]["name"].is_array());
    }

    #[tokio::test]
    async fn test_validation_message_surfaces_rule_message() {
        let mut errors = ValidationErrors::new();
        errors.add(
            "email",
            validator::ValidationError::new("email").with_message("Invalid email format".into()),
        );
        let (_, body) = into_parts(AppError::ValidationError(errors)).await;
        assert_eq!(body["message"], "Invalid email format");
    }

    #[test]
    fn test_status_mapping_for_auth_errors() {
        assert_eq!(AppError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
    }
}
