//! Error types for outbound email.

use thiserror::Error;

pub type NotificationResult<T> = Result<T, NotificationError>;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Template error: {0}")]
    TemplateError(String),

    /// Provider error (SendGrid, transport, ...)
    #[error("Provider error: {0}")]
    ProviderError(String),
}

impl From<eyre::Report> for NotificationError {
    fn from(err: eyre::Report) -> Self {
        Self::ProviderError(err.to_string())
    }
}

impl From<core_config::ConfigError> for NotificationError {
    fn from(err: core_config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}
