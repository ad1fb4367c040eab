//! Auth Service - login, token refresh, password reset, Google sign-in

use axum_helpers::{JwtAuth, TokenKind};
use chrono::{Duration, Utc};
use email::Mailer;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::identity::IdentityVerifier;
use crate::models::{
    LoginResponse, ResetPasswordResponse, Role, SessionUser, TokenResponse, User, normalize_email,
};
use crate::password::{generate_reset_token, hash_password, token_digest, verify_password};
use crate::repository::UserRepository;
use crate::validation::{check, validate_password};

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Base URL of the web client; reset links and redirects point here
    pub client_url: String,
    pub reset_token_ttl: Duration,
}

impl AuthConfig {
    pub fn new(client_url: impl Into<String>) -> Self {
        Self {
            client_url: client_url.into().trim_end_matches('/').to_string(),
            reset_token_ttl: Duration::hours(1),
        }
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/reset-password/{}", self.client_url, token)
    }

    pub fn new_password_url(&self, token: &str) -> String {
        format!("{}/new-password/{}", self.client_url, token)
    }
}

pub struct AuthService<R: UserRepository> {
    repository: Arc<R>,
    jwt: JwtAuth,
    mailer: Mailer,
    identity: Option<Arc<dyn IdentityVerifier>>,
    config: AuthConfig,
}

impl<R: UserRepository> AuthService<R> {
    pub fn new(repository: Arc<R>, jwt: JwtAuth, mailer: Mailer, config: AuthConfig) -> Self {
        Self {
            repository,
            jwt,
            mailer,
            identity: None,
            config,
        }
    }

    /// Enable Google sign-in.
    pub fn with_identity_verifier(mut self, verifier: Arc<dyn IdentityVerifier>) -> Self {
        self.identity = Some(verifier);
        self
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> UserResult<LoginResponse> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(UserError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let user = self
            .repository
            .get_by_email(email)
            .await?
            .ok_or(UserError::EmailNotFound)?;

        let Some(hash) = user.password.as_deref() else {
            return Err(UserError::InvalidCredentials);
        };
        if !verify_password(password, hash)? {
            tracing::info!(user_id = %user.id, "login rejected: wrong password");
            return Err(UserError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "login succeeded");
        self.issue_tokens(&user)
    }

    /// Exchange a refresh token for a new access token.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> UserResult<TokenResponse> {
        if refresh_token.trim().is_empty() {
            return Err(UserError::Validation("Refresh token is required".to_string()));
        }

        let claims = self
            .jwt
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(|e| {
                tracing::debug!(error = %e, "refresh token rejected");
                UserError::InvalidToken
            })?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| UserError::InvalidToken)?;

        let user = self
            .repository
            .get_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound(user_id))?;

        Ok(TokenResponse {
            token: self.access_token(&user)?,
        })
    }

    /// Store a fresh reset token and mail the link.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn request_password_reset(&self, email: &str) -> UserResult<()> {
        if email.trim().is_empty() {
            return Err(UserError::Validation("Email is required".to_string()));
        }

        let mut user = self
            .repository
            .get_by_email(email)
            .await?
            .ok_or(UserError::EmailNotFound)?;

        let reset = generate_reset_token();
        user.reset_token = Some(reset.digest);
        user.reset_token_expiration = Some(Utc::now() + self.config.reset_token_ttl);
        user.updated_at = Utc::now();
        let user = self.repository.update(user).await?;

        self.mailer
            .send_password_reset(&user.email, &user.name, &self.config.reset_link(&reset.token))
            .await?;

        tracing::info!(user_id = %user.id, "password reset requested");
        Ok(())
    }

    /// Where the emailed link should redirect, if the token is still valid.
    #[instrument(skip_all)]
    pub async fn check_reset_token(&self, token: &str) -> UserResult<String> {
        self.user_for_reset_token(token).await?;
        Ok(self.config.new_password_url(token))
    }

    /// Set a new password with a reset token; the token is single-use.
    #[instrument(skip_all)]
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> UserResult<ResetPasswordResponse> {
        let mut user = self.user_for_reset_token(token).await?;

        if new_password.is_empty() {
            return Err(UserError::Validation("New password is required".to_string()));
        }
        check(validate_password(new_password))?;

        user.set_password_hash(hash_password(new_password)?);
        user.clear_reset_token();
        let user = self.repository.update(user).await?;

        tracing::info!(user_id = %user.id, "password reset completed");
        Ok(ResetPasswordResponse {
            message: "Password reset successful".to_string(),
            user: user.into(),
        })
    }

    /// Sign in with a Google ID token, linking or creating the local account.
    #[instrument(skip_all)]
    pub async fn google_login(&self, id_token: &str) -> UserResult<LoginResponse> {
        let verifier = self
            .identity
            .as_ref()
            .ok_or_else(|| UserError::Internal("Google sign-in is not configured".to_string()))?;
        let identity = verifier.verify(id_token).await?;

        if let Some(user) = self.repository.get_by_google_id(&identity.subject).await? {
            return self.issue_tokens(&user);
        }

        let user = match self.repository.get_by_email(&identity.email).await? {
            Some(mut existing) => {
                existing.google_id = Some(identity.subject.clone());
                existing.updated_at = Utc::now();
                tracing::info!(user_id = %existing.id, "linked Google account");
                self.repository.update(existing).await?
            }
            None => {
                let email = normalize_email(&identity.email);
                let name = identity
                    .name
                    .clone()
                    .filter(|n| n.trim().chars().count() >= 2)
                    .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
                let mut user = User::new(name, email, None, Role::User);
                user.google_id = Some(identity.subject.clone());
                tracing::info!(user_id = %user.id, "created user from Google sign-in");
                self.repository.create(user).await?
            }
        };

        self.issue_tokens(&user)
    }

    async fn user_for_reset_token(&self, token: &str) -> UserResult<User> {
        if token.trim().is_empty() {
            return Err(UserError::InvalidResetToken);
        }
        let user = self
            .repository
            .get_by_reset_token(&token_digest(token))
            .await?
            .ok_or(UserError::InvalidResetToken)?;

        if !user.reset_token_valid(Utc::now()) {
            return Err(UserError::InvalidResetToken);
        }
        Ok(user)
    }

    fn access_token(&self, user: &User) -> UserResult<String> {
        self.jwt
            .create_access_token(&user.id.to_string(), &user.email, &user.role.to_string())
            .map_err(|e| UserError::Internal(format!("failed to sign access token: {e}")))
    }

    fn issue_tokens(&self, user: &User) -> UserResult<LoginResponse> {
        let token = self.access_token(user)?;
        let refresh_token = self
            .jwt
            .create_refresh_token(&user.id.to_string())
            .map_err(|e| UserError::Internal(format!("failed to sign refresh token: {e}")))?;

        Ok(LoginResponse {
            token,
            refresh_token,
            user: SessionUser::from(user),
        })
    }
}

impl<R: UserRepository> Clone for AuthService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            jwt: self.jwt.clone(),
            mailer: self.mailer.clone(),
            identity: self.identity.clone(),
            config: self.config.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{ExternalIdentity, MockIdentityVerifier};
    use crate::repository::InMemoryUserRepository;
    use axum_helpers::JwtConfig;
    use email::{MailerConfig, MockEmailProvider};

    const SECRET: &str = "test-secret-that-is-at-least-32-characters";

    struct Fixture {
        repo: Arc<InMemoryUserRepository>,
        outbox: MockEmailProvider,
        jwt: JwtAuth,
        service: AuthService<InMemoryUserRepository>,
    }

    fn fixture_with(outbox: MockEmailProvider) -> Fixture {
        let repo = Arc::new(InMemoryUserRepository::new());
        let jwt = JwtAuth::new(&JwtConfig::new(SECRET).unwrap());
        let mailer = Mailer::new(Arc::new(outbox.clone()), MailerConfig::default()).unwrap();
        let service = AuthService::new(
            Arc::clone(&repo),
            jwt.clone(),
            mailer,
            AuthConfig::new("http://localhost:3000/"),
        );
        Fixture {
            repo,
            outbox,
            jwt,
            service,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(MockEmailProvider::new())
    }

    async fn seed(repo: &InMemoryUserRepository, role: Role) -> User {
        let hash = hash_password("Password123!").unwrap();
        let user = User::new("John".into(), "john@example.com".into(), Some(hash), role);
        repo.create(user).await.unwrap()
    }

    fn token_from_link(body: &str) -> String {
        let start = body.find("/reset-password/").unwrap() + "/reset-password/".len();
        body[start..start + 64].to_string()
    }

    #[tokio::test]
    async fn test_login_token_carries_id_and_role() {
        let f = fixture();
        let user = seed(&f.repo, Role::Organizer).await;

        let response = f.service.login("john@example.com", "Password123!").await.unwrap();

        let claims = f.jwt.verify(&response.token, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.role.as_deref(), Some("organizer"));
        assert_eq!(response.user.id, user.id);
        assert!(f.jwt.verify(&response.refresh_token, TokenKind::Refresh).is_ok());
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let f = fixture();
        let err = f.service.login("nobody@example.com", "Password123!").await.unwrap_err();
        assert!(matches!(err, UserError::EmailNotFound));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let f = fixture();
        seed(&f.repo, Role::User).await;
        let err = f.service.login("john@example.com", "nope12345").await.unwrap_err();
        assert!(matches!(err, UserError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_rejects_stored_plaintext_match() {
        let f = fixture();
        let user = User::new("Legacy".into(), "legacy@example.com".into(), None, Role::User);
        f.repo.create(user).await.unwrap();

        let err = f.service.login("legacy@example.com", "whatever1").await.unwrap_err();
        assert!(matches!(err, UserError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_refresh_issues_access_token() {
        let f = fixture();
        let user = seed(&f.repo, Role::User).await;
        let login = f.service.login("john@example.com", "Password123!").await.unwrap();

        let refreshed = f.service.refresh(&login.refresh_token).await.unwrap();
        let claims = f.jwt.verify(&refreshed.token, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let f = fixture();
        seed(&f.repo, Role::User).await;
        let login = f.service.login("john@example.com", "Password123!").await.unwrap();

        let err = f.service.refresh(&login.token).await.unwrap_err();
        assert!(matches!(err, UserError::InvalidToken));
    }

    #[tokio::test]
    async fn test_reset_flow_end_to_end() {
        let f = fixture();
        let user = seed(&f.repo, Role::User).await;

        f.service.request_password_reset("John@Example.com").await.unwrap();

        let sent = f.outbox.sent_emails().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Password Reset Request");
        let body = sent[0].body_text.clone().unwrap();
        assert!(body.contains("http://localhost:3000/reset-password/"));
        let token = token_from_link(&body);

        // Only the digest is stored.
        let stored = f.repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_ne!(stored.reset_token.as_deref(), Some(token.as_str()));

        let redirect = f.service.check_reset_token(&token).await.unwrap();
        assert_eq!(redirect, format!("http://localhost:3000/new-password/{token}"));

        let response = f.service.reset_password(&token, "BrandNew123").await.unwrap();
        assert_eq!(response.message, "Password reset successful");
        assert_eq!(response.user.id, user.id);

        f.service.login("john@example.com", "BrandNew123").await.unwrap();

        // Single use.
        let err = f.service.reset_password(&token, "Another123").await.unwrap_err();
        assert!(matches!(err, UserError::InvalidResetToken));
    }

    #[tokio::test]
    async fn test_expired_reset_token() {
        let f = fixture();
        let mut user = seed(&f.repo, Role::User).await;
        user.reset_token = Some(token_digest("abc"));
        user.reset_token_expiration = Some(Utc::now() - Duration::minutes(1));
        f.repo.update(user).await.unwrap();

        let err = f.service.check_reset_token("abc").await.unwrap_err();
        assert!(matches!(err, UserError::InvalidResetToken));
    }

    #[tokio::test]
    async fn test_reset_request_unknown_email() {
        let f = fixture();
        let err = f.service.request_password_reset("ghost@example.com").await.unwrap_err();
        assert!(matches!(err, UserError::EmailNotFound));
        assert_eq!(f.outbox.sent_count().await, 0);
    }

    #[tokio::test]
    async fn test_reset_request_mailer_failure() {
        let f = fixture_with(MockEmailProvider::failing("sendgrid down"));
        seed(&f.repo, Role::User).await;

        let err = f.service.request_password_reset("john@example.com").await.unwrap_err();
        assert!(matches!(err, UserError::Email(_)));
    }

    fn google(subject: &str, email: &str) -> Arc<dyn IdentityVerifier> {
        let identity = ExternalIdentity {
            subject: subject.to_string(),
            email: email.to_string(),
            name: Some("Grace Hopper".to_string()),
        };
        let mut mock = MockIdentityVerifier::new();
        mock.expect_verify().returning(move |_| Ok(identity.clone()));
        Arc::new(mock)
    }

    #[tokio::test]
    async fn test_google_login_creates_then_reuses_user() {
        let f = fixture();
        let service = f.service.clone().with_identity_verifier(google("g-1", "grace@example.com"));

        let first = service.google_login("id-token").await.unwrap();
        let second = service.google_login("id-token").await.unwrap();
        assert_eq!(first.user.id, second.user.id);

        let stored = f.repo.get_by_id(first.user.id).await.unwrap().unwrap();
        assert!(stored.password.is_none());
        assert_eq!(stored.google_id.as_deref(), Some("g-1"));
        assert_eq!(stored.name, "Grace Hopper");
    }

    #[tokio::test]
    async fn test_google_login_links_existing_email() {
        let f = fixture();
        let user = seed(&f.repo, Role::User).await;
        let service = f.service.clone().with_identity_verifier(google("g-2", "JOHN@example.com"));

        let response = service.google_login("id-token").await.unwrap();
        assert_eq!(response.user.id, user.id);

        let stored = f.repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.google_id.as_deref(), Some("g-2"));
        assert!(stored.password.is_some());
    }

    #[tokio::test]
    async fn test_google_login_unconfigured() {
        let f = fixture();
        let err = f.service.google_login("id-token").await.unwrap_err();
        assert!(matches!(err, UserError::Internal(_)));
    }
}
