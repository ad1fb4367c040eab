use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Message is required")]
    EmptyMessage,

    #[error("Chat model error: {0}")]
    Model(String),

    #[error("Tool execution error: {0}")]
    Tool(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AssistantResult<T> = Result<T, AssistantError>;

impl From<AssistantError> for AppError {
    fn from(err: AssistantError) -> Self {
        match err {
            AssistantError::ThreadNotFound(_) => AppError::NotFound("Thread not found".to_string()),
            AssistantError::EmptyMessage => AppError::BadRequest(err.to_string()),
            AssistantError::Model(msg)
            | AssistantError::Tool(msg)
            | AssistantError::Database(msg)
            | AssistantError::Internal(msg) => {
                tracing::error!(error = %msg, "assistant request failed");
                AppError::InternalServerError("Failed to process chat".to_string())
            }
        }
    }
}

impl IntoResponse for AssistantError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for AssistantError {
    fn from(err: mongodb::error::Error) -> Self {
        AssistantError::Database(err.to_string())
    }
}

impl From<reqwest::Error> for AssistantError {
    fn from(err: reqwest::Error) -> Self {
        AssistantError::Model(err.to_string())
    }
}
