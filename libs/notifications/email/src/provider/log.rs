//! Provider that writes messages to the log instead of sending them.
//!
//! Selected in development when no SendGrid key is configured, so reset
//! links can be copied from the console.

use super::{EmailProvider, SendResult};
use crate::models::Email;
use async_trait::async_trait;
use eyre::Result;
use tracing::info;

#[derive(Debug, Default, Clone)]
pub struct LogProvider;

#[async_trait]
impl EmailProvider for LogProvider {
    async fn send(&self, email: &Email) -> Result<SendResult> {
        info!(
            to = %email.to,
            subject = %email.subject,
            body = email.body_text.as_deref().unwrap_or_default(),
            "email not sent (log provider)"
        );
        Ok(SendResult {
            message_id: format!("log-{}", email.id),
        })
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
