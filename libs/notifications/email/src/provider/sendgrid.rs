//! SendGrid email provider
//!
//! Sends emails via the SendGrid v3 HTTP API.

use crate::error::{NotificationError, NotificationResult};
use crate::models::Email;
use crate::provider::{EmailProvider, SendResult};
use async_trait::async_trait;
use core_config::{env_optional, env_required};
use eyre::{eyre, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

const SENDGRID_API_URL: &str = "https://api.sendgrid.com/v3/mail/send";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct SendGridProvider {
    api_key: String,
    from_email: String,
    from_name: String,
    endpoint: String,
    client: Client,
}

impl SendGridProvider {
    pub fn new(
        api_key: impl Into<String>,
        from_email: impl Into<String>,
        from_name: impl Into<String>,
    ) -> NotificationResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NotificationError::ConfigError(format!("http client: {e}")))?;

        Ok(Self {
            api_key: api_key.into(),
            from_email: from_email.into(),
            from_name: from_name.into(),
            endpoint: SENDGRID_API_URL.to_string(),
            client,
        })
    }

    /// Point the provider at another endpoint (tests, regional API hosts).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Create from environment variables
    ///
    /// - `SENDGRID_API_KEY`
    /// - `SENDGRID_FROM_EMAIL`
    /// - `SENDGRID_FROM_NAME` (default `EventHub`)
    pub fn from_env() -> NotificationResult<Self> {
        let api_key = env_required("SENDGRID_API_KEY")?;
        let from_email = env_required("SENDGRID_FROM_EMAIL")?;
        let from_name = env_optional("SENDGRID_FROM_NAME").unwrap_or_else(|| "EventHub".to_string());

        Self::new(api_key, from_email, from_name)
    }

    fn build_request(&self, email: &Email) -> Result<SendGridRequest> {
        let mut content = Vec::new();
        if let Some(text) = &email.body_text {
            content.push(Content {
                content_type: "text/plain".to_string(),
                value: text.clone(),
            });
        }
        if let Some(html) = &email.body_html {
            content.push(Content {
                content_type: "text/html".to_string(),
                value: html.clone(),
            });
        }
        if content.is_empty() {
            return Err(eyre!("Email must have text or HTML content"));
        }

        Ok(SendGridRequest {
            personalizations: vec![Personalization {
                to: vec![EmailAddress {
                    email: email.to.clone(),
                    name: None,
                }],
            }],
            from: EmailAddress {
                email: email
                    .from
                    .clone()
                    .unwrap_or_else(|| self.from_email.clone()),
                name: Some(self.from_name.clone()),
            },
            reply_to: email.reply_to.as_ref().map(|r| EmailAddress {
                email: r.clone(),
                name: None,
            }),
            subject: email.subject.clone(),
            content,
        })
    }
}

#[derive(Debug, Serialize)]
struct SendGridRequest {
    personalizations: Vec<Personalization>,
    from: EmailAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<EmailAddress>,
    subject: String,
    content: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Personalization {
    to: Vec<EmailAddress>,
}

#[derive(Debug, Serialize)]
struct EmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(rename = "type")]
    content_type: String,
    value: String,
}

#[async_trait]
impl EmailProvider for SendGridProvider {
    async fn send(&self, email: &Email) -> Result<SendResult> {
        let request = self.build_request(email)?;

        debug!(to = %email.to, subject = %email.subject, "Sending email via SendGrid");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| eyre!("SendGrid request failed: {}", e))?;

        let status = response.status();
        if status.is_success() {
            // SendGrid returns the message id in X-Message-Id
            let message_id = response
                .headers()
                .get("X-Message-Id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or(&email.id)
                .to_string();

            debug!(message_id = %message_id, "Email sent");
            return Ok(SendResult { message_id });
        }

        let error_body = response.text().await.unwrap_or_default();
        error!(status = %status, error = %error_body, "SendGrid API error");

        match status.as_u16() {
            429 => Err(eyre!("rate limit exceeded")),
            400 => Err(eyre!("invalid request: {}", error_body)),
            401 | 403 => Err(eyre!("authentication failed")),
            _ => Err(eyre!("SendGrid error ({}): {}", status, error_body)),
        }
    }

    async fn health_check(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(eyre!("SendGrid API key not configured"));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sendgrid"
    }
}
