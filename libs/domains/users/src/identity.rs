//! Federated identity verification (Google sign-in).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

use crate::error::{UserError, UserResult};

const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Identity asserted by a verified third-party token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    /// Provider-scoped stable user id
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify `id_token` and return the identity it asserts.
    async fn verify(&self, id_token: &str) -> UserResult<ExternalIdentity>;
}

/// Verifies Google ID tokens against the `tokeninfo` endpoint.
pub struct GoogleIdentityVerifier {
    client: Client,
    client_id: String,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    iss: String,
    sub: String,
    aud: String,
    email: Option<String>,
    /// Google sends this as the string "true"/"false"
    email_verified: Option<String>,
    name: Option<String>,
}

impl GoogleIdentityVerifier {
    pub fn new(client_id: impl Into<String>) -> UserResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| UserError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            client,
            client_id: client_id.into(),
            endpoint: GOOGLE_TOKENINFO_URL.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn check_claims(&self, info: TokenInfo) -> UserResult<ExternalIdentity> {
        if info.aud != self.client_id {
            return Err(UserError::Identity("audience mismatch".to_string()));
        }
        if !GOOGLE_ISSUERS.contains(&info.iss.as_str()) {
            return Err(UserError::Identity(format!("unexpected issuer {}", info.iss)));
        }
        if info.email_verified.as_deref() != Some("true") {
            return Err(UserError::Identity("email not verified".to_string()));
        }
        let email = info
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| UserError::Identity("token carries no email".to_string()))?;

        Ok(ExternalIdentity {
            subject: info.sub,
            email,
            name: info.name,
        })
    }
}

#[async_trait]
impl IdentityVerifier for GoogleIdentityVerifier {
    #[instrument(skip_all)]
    async fn verify(&self, id_token: &str) -> UserResult<ExternalIdentity> {
        if id_token.trim().is_empty() {
            return Err(UserError::Validation("ID token is required".to_string()));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| UserError::Internal(format!("tokeninfo request failed: {e}")))?;

        let status = response.status();
        if status.is_client_error() {
            return Err(UserError::Identity(format!("tokeninfo returned {status}")));
        }
        if !status.is_success() {
            return Err(UserError::Internal(format!("tokeninfo returned {status}")));
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| UserError::Internal(format!("tokeninfo body: {e}")))?;

        self.check_claims(info)
    }
}
