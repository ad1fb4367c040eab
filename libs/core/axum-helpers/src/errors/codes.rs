//! Error codes carried in every error body.
//!
//! Each code has a machine-readable name for clients, an integer for log
//! correlation and a fallback message.
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! let code = ErrorCode::InvalidId;
//! assert_eq!(code.as_str(), "INVALID_ID");
//! assert_eq!(code.code(), 1002);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request body or query failed field validation
    ValidationError,
    /// Path or body id is not a valid identifier
    InvalidId,
    /// Body could not be read as JSON
    JsonExtraction,
    /// Query string could not be parsed
    QueryExtraction,
    /// Referenced record does not exist
    NotFound,
    /// Request violates a business rule (duplicate name, wrong password, ...)
    BadRequest,
    Unauthorized,
    Forbidden,
    Conflict,
    MethodNotAllowed,
    /// A downstream dependency failed or returned an unexpected shape
    InternalError,
    ServiceUnavailable,
    /// Infrastructure failures; details stay in the logs
    IoError,
    SerdeJsonError,
}

impl ErrorCode {
    /// Name, number and fallback message, in that order.
    const fn meta(&self) -> (&'static str, i32, &'static str) {
        const HIDDEN: &str = "An internal server error occurred";
        match self {
            Self::ValidationError => ("VALIDATION_ERROR", 1001, "Request validation failed"),
            Self::InvalidId => ("INVALID_ID", 1002, "Invalid ID format"),
            Self::JsonExtraction => ("JSON_EXTRACTION", 1003, "Invalid JSON body"),
            Self::NotFound => ("NOT_FOUND", 1004, "Resource not found"),
            Self::InternalError => ("INTERNAL_ERROR", 1005, HIDDEN),
            Self::Unauthorized => ("UNAUTHORIZED", 1006, "Authentication required"),
            Self::Forbidden => ("FORBIDDEN", 1007, "Access forbidden"),
            Self::Conflict => ("CONFLICT", 1008, "Resource already exists"),
            Self::BadRequest => ("BAD_REQUEST", 1009, "Bad request"),
            Self::QueryExtraction => ("QUERY_EXTRACTION", 1010, "Invalid query parameters"),
            Self::ServiceUnavailable => {
                ("SERVICE_UNAVAILABLE", 1011, "Service is temporarily unavailable")
            }
            Self::MethodNotAllowed => ("METHOD_NOT_ALLOWED", 1012, "Method not allowed"),
            Self::IoError => ("IO_ERROR", 4001, HIDDEN),
            Self::SerdeJsonError => ("SERDE_JSON_ERROR", 5001, HIDDEN),
        }
    }

    pub const fn as_str(&self) -> &'static str {
        self.meta().0
    }

    pub const fn code(&self) -> i32 {
        self.meta().1
    }

    pub const fn default_message(&self) -> &'static str {
        self.meta().2
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_names_and_numbers() {
        assert_eq!(ErrorCode::InvalidId.as_str(), "INVALID_ID");
        assert_eq!(ErrorCode::BadRequest.code(), 1009);
        assert_eq!(ErrorCode::SerdeJsonError.code(), 5001);
    }

    #[test]
    fn test_infrastructure_codes_hide_details() {
        assert_eq!(
            ErrorCode::IoError.default_message(),
            ErrorCode::InternalError.default_message()
        );
    }

    #[test]
    fn test_error_code_serde_matches_as_str() {
        for code in [ErrorCode::ValidationError, ErrorCode::NotFound, ErrorCode::QueryExtraction] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
            let back: ErrorCode = serde_json::from_str(&json).unwrap();
            assert_eq!(back, code);
        }
    }

    #[test]
    fn test_numeric_codes_are_unique() {
        let all = [
            ErrorCode::ValidationError,
            ErrorCode::InvalidId,
            ErrorCode::JsonExtraction,
            ErrorCode::QueryExtraction,
            ErrorCode::NotFound,
            ErrorCode::BadRequest,
            ErrorCode::Unauthorized,
            ErrorCode::Forbidden,
            ErrorCode::Conflict,
            ErrorCode::MethodNotAllowed,
            ErrorCode::InternalError,
            ErrorCode::ServiceUnavailable,
            ErrorCode::IoError,
            ErrorCode::SerdeJsonError,
        ];
        let mut numbers: Vec<i32> = all.iter().map(ErrorCode::code).collect();
        numbers.sort_unstable();
        numbers.dedup();
        assert_eq!(numbers.len(), all.len());
    }
}
