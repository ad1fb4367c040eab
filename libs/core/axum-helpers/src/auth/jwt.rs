use super::config::JwtConfig;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which half of the token pair a JWT is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims carried by both token kinds. Refresh tokens omit `email` and `role`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// User id
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub typ: TokenKind,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token rejected: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("expected a {expected:?} token")]
    WrongKind { expected: TokenKind },
}

/// Issues and verifies HS256 tokens.
#[derive(Clone)]
pub struct JwtAuth {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtAuth {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            access_ttl: Duration::seconds(config.access_ttl_secs),
            refresh_ttl: Duration::seconds(config.refresh_ttl_secs),
        }
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    pub fn create_access_token(
        &self,
        user_id: &str,
        email: &str,
        role: &str,
    ) -> Result<String, TokenError> {
        self.sign(
            user_id,
            Some(email.to_string()),
            Some(role.to_string()),
            TokenKind::Access,
            self.access_ttl,
        )
    }

    pub fn create_refresh_token(&self, user_id: &str) -> Result<String, TokenError> {
        self.sign(user_id, None, None, TokenKind::Refresh, self.refresh_ttl)
    }

    fn sign(
        &self,
        user_id: &str,
        email: Option<String>,
        role: Option<String>,
        typ: TokenKind,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: user_id.to_string(),
            email,
            role,
            typ,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let header = Header::new(Algorithm::HS256);
        Ok(encode(&header, &claims, &self.encoding)?)
    }

    /// Check signature and expiry, and that the token is of the `expected` kind.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<JwtClaims, TokenError> {
        let data = decode::<JwtClaims>(token, &self.decoding, &Validation::new(Algorithm::HS256))?;
        if data.claims.typ != expected {
            return Err(TokenError::WrongKind { expected });
        }
        Ok(data.claims)
    }
}
