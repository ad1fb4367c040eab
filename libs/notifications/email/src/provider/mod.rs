//! Email provider implementations

pub mod log;
pub mod mock;
pub mod sendgrid;

pub use log::LogProvider;
pub use mock::MockEmailProvider;
pub use sendgrid::SendGridProvider;

use crate::models::Email;
use async_trait::async_trait;
use eyre::Result;

/// Result of sending an email
#[derive(Debug)]
pub struct SendResult {
    /// Provider-specific message ID
    pub message_id: String,
}

/// Trait for email providers
#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, email: &Email) -> Result<SendResult>;

    async fn health_check(&self) -> Result<()>;

    fn name(&self) -> &'static str;
}
