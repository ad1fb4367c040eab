//! In-memory outbox used by tests in place of a real provider

use super::{EmailProvider, SendResult};
use crate::models::Email;
use async_trait::async_trait;
use eyre::{Result, bail};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Records every delivered email. Clones share one outbox, so a test can keep
/// a handle while the `Mailer` owns another.
#[derive(Clone, Default)]
pub struct MockEmailProvider {
    outbox: Arc<Mutex<Vec<Email>>>,
    outage: Option<Arc<str>>,
}

impl MockEmailProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a provider outage: sends and health checks fail with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            outage: Some(Arc::from(reason.into())),
            ..Self::default()
        }
    }

    pub async fn sent_emails(&self) -> Vec<Email> {
        self.outbox.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.outbox.lock().await.len()
    }

    /// Most recent email delivered to `address`, compared case-insensitively.
    pub async fn last_sent_to(&self, address: &str) -> Option<Email> {
        self.outbox
            .lock()
            .await
            .iter()
            .rev()
            .find(|email| email.to.eq_ignore_ascii_case(address))
            .cloned()
    }
}

#[async_trait]
impl EmailProvider for MockEmailProvider {
    async fn send(&self, email: &Email) -> Result<SendResult> {
        if let Some(reason) = &self.outage {
            bail!("{reason}");
        }

        let message_id = format!("mock-{}", email.id);
        self.outbox.lock().await.push(email.clone());
        Ok(SendResult { message_id })
    }

    async fn health_check(&self) -> Result<()> {
        match &self.outage {
            Some(reason) => bail!("mock provider unavailable: {reason}"),
            None => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_deliveries_by_recipient() {
        let provider = MockEmailProvider::new();
        provider
            .send(&Email::new("ada@example.com", "First").with_text("1"))
            .await
            .unwrap();
        provider
            .send(&Email::new("ADA@example.com", "Second").with_text("2"))
            .await
            .unwrap();

        assert_eq!(provider.sent_count().await, 2);
        let last = provider.last_sent_to("ada@example.com").await.unwrap();
        assert_eq!(last.subject, "Second");
        assert!(provider.last_sent_to("bob@example.com").await.is_none());
    }

    #[tokio::test]
    async fn test_outage_rejects_sends() {
        let provider = MockEmailProvider::failing("sendgrid down");
        let result = provider
            .send(&Email::new("ada@example.com", "Hi").with_text("x"))
            .await;

        assert!(result.unwrap_err().to_string().contains("sendgrid down"));
        assert!(provider.health_check().await.is_err());
        assert_eq!(provider.sent_count().await, 0);
    }
}
