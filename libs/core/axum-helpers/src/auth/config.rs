use core_config::{ConfigError, FromEnv, env_parse_or, env_required};

/// Default access-token lifetime: 7 hours.
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 7 * 60 * 60;
/// Default refresh-token lifetime: 7 days.
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 7 * 24 * 60 * 60;

const MIN_SECRET_LEN: usize = 32;

/// Token signing configuration.
///
/// Environment variables:
/// - `JWT_SECRET` (required, at least 32 characters)
/// - `JWT_EXPIRATION` access-token lifetime in seconds (default 25200)
/// - `JWT_REFRESH_EXPIRATION` refresh-token lifetime in seconds (default 604800)
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        check_secret(&secret)?;
        Ok(Self {
            secret,
            access_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
        })
    }

    pub fn with_ttls(mut self, access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        self.access_ttl_secs = access_ttl_secs;
        self.refresh_ttl_secs = refresh_ttl_secs;
        self
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish()
    }
}

fn check_secret(secret: &str) -> Result<(), ConfigError> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(ConfigError::ParseError {
            key: "JWT_SECRET".to_string(),
            details: format!(
                "must be at least {MIN_SECRET_LEN} characters (got {}). Generate one with: openssl rand -base64 32",
                secret.len()
            ),
        });
    }
    Ok(())
}

impl FromEnv for JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = env_required("JWT_SECRET")?;
        let access_ttl_secs = env_parse_or("JWT_EXPIRATION", DEFAULT_ACCESS_TTL_SECS)?;
        let refresh_ttl_secs = env_parse_or("JWT_REFRESH_EXPIRATION", DEFAULT_REFRESH_TTL_SECS)?;

        Ok(Self::new(secret)?.with_ttls(access_ttl_secs, refresh_ttl_secs))
    }
}
