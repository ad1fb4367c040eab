use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Event not found: {0}")]
    NotFound(Uuid),

    #[error("Event name already exists")]
    DuplicateName,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid upload: {0}")]
    Upload(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Image storage failed: {0}")]
    Storage(String),

    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type EventResult<T> = Result<T, EventError>;

impl From<EventError> for AppError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::NotFound(_) => AppError::NotFound("Event not found".to_string()),
            EventError::DuplicateName => AppError::BadRequest(err.to_string()),
            EventError::Validation(msg) | EventError::Upload(msg) => AppError::BadRequest(msg),
            EventError::Embedding(msg) => {
                tracing::error!(error = %msg, "event embedding failed");
                AppError::InternalServerError("Failed to create event summary".to_string())
            }
            EventError::Storage(msg)
            | EventError::Lookup(msg)
            | EventError::Database(msg)
            | EventError::Internal(msg) => {
                tracing::error!(error = %msg, "event operation failed");
                AppError::InternalServerError("An internal error occurred".to_string())
            }
        }
    }
}

impl IntoResponse for EventError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for EventError {
    fn from(err: mongodb::error::Error) -> Self {
        if database::is_duplicate_key(&err) {
            return EventError::DuplicateName;
        }
        EventError::Database(err.to_string())
    }
}

impl From<validator::ValidationErrors> for EventError {
    fn from(errors: validator::ValidationErrors) -> Self {
        EventError::Validation(crate::validation::first_message(&errors))
    }
}

impl From<std::io::Error> for EventError {
    fn from(err: std::io::Error) -> Self {
        EventError::Storage(err.to_string())
    }
}
