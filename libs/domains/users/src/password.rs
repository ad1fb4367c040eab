//! Password hashing and reset-token generation.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::{OsRng, RngCore},
    },
};
use sha2::{Digest, Sha256};

use crate::error::{UserError, UserResult};

pub fn hash_password(password: &str) -> UserResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::PasswordHash(e.to_string()))
}

/// Constant-time Argon2 verification. There is no plain-text fallback.
pub fn verify_password(password: &str, hash: &str) -> UserResult<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| UserError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// A reset token as mailed to the user plus the digest that gets stored.
pub struct ResetToken {
    pub token: String,
    pub digest: String,
}

/// 32 random bytes, hex encoded.
pub fn generate_reset_token() -> ResetToken {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    let token = const_hex::encode(bytes);
    let digest = token_digest(&token);
    ResetToken { token, digest }
}

/// SHA-256 of a reset token; only digests are persisted.
pub fn token_digest(token: &str) -> String {
    const_hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Password123!").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Password123!", &hash).unwrap());
        assert!(!verify_password("Password123?", &hash).unwrap());
    }

    #[test]
    fn test_plain_text_is_not_a_hash() {
        assert!(verify_password("Password123!", "Password123!").is_err());
    }

    #[test]
    fn test_reset_token_shape() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_eq!(a.token.len(), 64);
        assert_ne!(a.token, b.token);
        assert_eq!(a.digest, token_digest(&a.token));
        assert_ne!(a.digest, a.token);
    }
}
