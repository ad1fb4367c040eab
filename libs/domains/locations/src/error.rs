use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Location not found: {0}")]
    NotFound(Uuid),

    /// A lookup that legitimately ran but matched nothing
    #[error("{0}")]
    NoMatch(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Geocoding failed: {0}")]
    Geocoding(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type LocationResult<T> = Result<T, LocationError>;

impl From<LocationError> for AppError {
    fn from(err: LocationError) -> Self {
        match err {
            LocationError::NotFound(_) => AppError::NotFound("Location not found".to_string()),
            LocationError::NoMatch(msg) => AppError::NotFound(msg),
            LocationError::Validation(msg) => AppError::BadRequest(msg),
            LocationError::Geocoding(msg) => {
                tracing::error!(error = %msg, "geocoding failed");
                AppError::InternalServerError("Failed to fetch coordinates".to_string())
            }
            LocationError::Database(msg) | LocationError::Internal(msg) => {
                tracing::error!(error = %msg, "location operation failed");
                AppError::InternalServerError("An internal error occurred".to_string())
            }
        }
    }
}

impl IntoResponse for LocationError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for LocationError {
    fn from(err: mongodb::error::Error) -> Self {
        LocationError::Database(err.to_string())
    }
}

impl From<validator::ValidationErrors> for LocationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        LocationError::Validation(crate::validation::first_message(&errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (LocationError::NotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (LocationError::NoMatch("none".into()), StatusCode::NOT_FOUND),
            (LocationError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (LocationError::Geocoding("no results".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (LocationError::Database("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn test_geocoding_message_is_stable() {
        let app: AppError = LocationError::Geocoding("HTTP 402 quota exceeded".into()).into();
        assert!(matches!(app, AppError::InternalServerError(ref m) if m == "Failed to fetch coordinates"));
    }
}
