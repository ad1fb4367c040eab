//! High-level mailer used by the auth flows.

use crate::error::{NotificationError, NotificationResult};
use crate::models::Email;
use crate::provider::{EmailProvider, LogProvider, SendGridProvider, SendResult};
use crate::templates::{TemplateEngine, PASSWORD_RESET};
use core_config::{env_optional, Environment};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// Product name used in subjects and signatures
    pub app_name: String,
    /// Lifetime of a password-reset link, shown to the recipient
    pub reset_link_ttl: Duration,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            app_name: "EventHub".to_string(),
            reset_link_ttl: Duration::from_secs(3600),
        }
    }
}

/// Renders templates and hands messages to an [`EmailProvider`].
#[derive(Clone)]
pub struct Mailer {
    provider: Arc<dyn EmailProvider>,
    templates: Arc<TemplateEngine>,
    config: MailerConfig,
}

impl Mailer {
    pub fn new(provider: Arc<dyn EmailProvider>, config: MailerConfig) -> NotificationResult<Self> {
        let templates = TemplateEngine::new()
            .map_err(|e| NotificationError::TemplateError(e.to_string()))?;
        Ok(Self {
            provider,
            templates: Arc::new(templates),
            config,
        })
    }

    /// SendGrid when `SENDGRID_API_KEY` is set. Without it, development falls back
    /// to [`LogProvider`] and production refuses to start.
    pub fn from_env(environment: &Environment) -> NotificationResult<Self> {
        let provider: Arc<dyn EmailProvider> = match env_optional("SENDGRID_API_KEY") {
            Some(_) => Arc::new(SendGridProvider::from_env()?),
            None if environment.is_production() => {
                return Err(NotificationError::ConfigError(
                    "SENDGRID_API_KEY is required in production".to_string(),
                ));
            }
            None => {
                warn!("SENDGRID_API_KEY not set, emails will only be logged");
                Arc::new(LogProvider)
            }
        };

        let mut config = MailerConfig::default();
        if let Some(name) = env_optional("APP_NAME") {
            config.app_name = name;
        }
        Self::new(provider, config)
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Send the password-reset message with a link to `reset_link`.
    #[instrument(skip(self, reset_link), fields(provider = self.provider.name()))]
    pub async fn send_password_reset(
        &self,
        to: &str,
        name: &str,
        reset_link: &str,
    ) -> NotificationResult<SendResult> {
        if to.trim().is_empty() {
            return Err(NotificationError::InvalidInput("recipient is empty".to_string()));
        }

        let data = json!({
            "name": name,
            "app_name": self.config.app_name,
            "reset_link": reset_link,
            "expiry_minutes": self.config.reset_link_ttl.as_secs() / 60,
        });
        let rendered = self
            .templates
            .render(PASSWORD_RESET, &data)
            .map_err(|e| NotificationError::TemplateError(e.to_string()))?;

        let mut email = Email::new(to, rendered.subject);
        email.body_text = rendered.body_text;
        email.body_html = rendered.body_html;

        let result = self.provider.send(&email).await?;
        info!(message_id = %result.message_id, "password reset email sent");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockEmailProvider;

    #[tokio::test]
    async fn test_password_reset_goes_through_provider() {
        let provider = MockEmailProvider::new();
        let mailer = Mailer::new(Arc::new(provider.clone()), MailerConfig::default()).unwrap();

        mailer
            .send_password_reset("ada@example.com", "Ada", "http://localhost:3000/reset-password/t0k")
            .await
            .unwrap();

        let sent = provider.sent_emails().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Password Reset Request");
        assert!(sent[0]
            .body_text
            .as_deref()
            .unwrap()
            .contains("http://localhost:3000/reset-password/t0k"));
    }

    #[tokio::test]
    async fn test_provider_failure_surfaces() {
        let provider = MockEmailProvider::failing("smtp down");
        let mailer = Mailer::new(Arc::new(provider), MailerConfig::default()).unwrap();

        let err = mailer
            .send_password_reset("ada@example.com", "Ada", "http://x")
            .await
            .unwrap_err();
        assert!(matches!(err, NotificationError::ProviderError(_)));
    }

    #[tokio::test]
    async fn test_empty_recipient_rejected() {
        let mailer = Mailer::new(Arc::new(MockEmailProvider::new()), MailerConfig::default()).unwrap();
        let err = mailer.send_password_reset(" ", "Ada", "http://x").await.unwrap_err();
        assert!(matches!(err, NotificationError::InvalidInput(_)));
    }

    #[test]
    fn test_from_env_provider_selection() {
        temp_env::with_var("SENDGRID_API_KEY", None::<&str>, || {
            let mailer = Mailer::from_env(&Environment::Development).unwrap();
            assert_eq!(mailer.provider_name(), "log");
            assert!(Mailer::from_env(&Environment::Production).is_err());
        });
    }
}
