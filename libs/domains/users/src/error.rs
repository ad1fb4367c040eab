use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(Uuid),

    #[error("User not found")]
    EmailNotFound,

    #[error("Email already in use")]
    DuplicateEmail,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Current password is incorrect")]
    IncorrectPassword,

    #[error("Invalid or expired token")]
    InvalidResetToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Identity provider rejected token: {0}")]
    Identity(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Email error: {0}")]
    Email(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) | UserError::EmailNotFound => {
                AppError::NotFound("User not found".to_string())
            }
            UserError::DuplicateEmail
            | UserError::InvalidCredentials
            | UserError::IncorrectPassword
            | UserError::InvalidResetToken => AppError::BadRequest(err.to_string()),
            UserError::Validation(msg) => AppError::BadRequest(msg),
            UserError::InvalidToken => AppError::Unauthorized(err.to_string()),
            UserError::Identity(msg) => {
                tracing::warn!(reason = %msg, "federated login rejected");
                AppError::Unauthorized("Invalid Google token".to_string())
            }
            UserError::Forbidden(msg) => AppError::Forbidden(msg),
            UserError::Email(msg) => {
                tracing::error!(error = %msg, "mail delivery failed");
                AppError::InternalServerError("Failed to send email".to_string())
            }
            UserError::PasswordHash(msg) | UserError::Database(msg) | UserError::Internal(msg) => {
                tracing::error!(error = %msg, "user operation failed");
                AppError::InternalServerError("An internal error occurred".to_string())
            }
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for UserError {
    fn from(err: mongodb::error::Error) -> Self {
        UserError::Database(err.to_string())
    }
}

impl From<validator::ValidationErrors> for UserError {
    fn from(errors: validator::ValidationErrors) -> Self {
        UserError::Validation(crate::validation::first_message(&errors))
    }
}

impl From<email::NotificationError> for UserError {
    fn from(err: email::NotificationError) -> Self {
        UserError::Email(err.to_string())
    }
}
