use super::jwt::JwtClaims;
use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use uuid::Uuid;

/// Identity of the caller, taken from claims that
/// [`jwt_auth_middleware`](super::jwt_auth_middleware) verified.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

impl AuthUser {
    pub fn has_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|r| r.eq_ignore_ascii_case(&self.role))
    }

    /// `Forbidden` unless the caller holds one of `roles`.
    pub fn require_role(&self, roles: &[&str]) -> Result<(), AppError> {
        if self.has_role(roles) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Requires one of the roles: {}",
                roles.join(", ")
            )))
        }
    }

    /// `Forbidden` unless the caller is `owner` or holds one of `roles`.
    pub fn require_self_or_role(&self, owner: Uuid, roles: &[&str]) -> Result<(), AppError> {
        if self.id == owner {
            return Ok(());
        }
        self.require_role(roles)
    }
}

impl TryFrom<&JwtClaims> for AuthUser {
    type Error = AppError;

    fn try_from(claims: &JwtClaims) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Malformed token subject".to_string()))?;
        Ok(Self {
            id,
            email: claims.email.clone().unwrap_or_default(),
            role: claims.role.clone().unwrap_or_default(),
        })
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<JwtClaims>()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;
        AuthUser::try_from(claims)
    }
}

/// `Option<AuthUser>` for routes behind
/// [`optional_jwt_auth_middleware`](super::optional_jwt_auth_middleware).
impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        parts
            .extensions
            .get::<JwtClaims>()
            .map(AuthUser::try_from)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenKind;

    fn claims(sub: &str, role: &str) -> JwtClaims {
        JwtClaims {
            sub: sub.to_string(),
            email: Some("o@example.com".to_string()),
            role: Some(role.to_string()),
            typ: TokenKind::Access,
            exp: 0,
            iat: 0,
            jti: "j".to_string(),
        }
    }

    #[test]
    fn test_role_checks() {
        let id = Uuid::now_v7();
        let user = AuthUser::try_from(&claims(&id.to_string(), "organizer")).unwrap();

        assert!(user.require_role(&["organizer", "admin"]).is_ok());
        assert!(matches!(user.require_role(&["admin"]), Err(AppError::Forbidden(_))));
        assert!(user.require_self_or_role(id, &["admin"]).is_ok());
        assert!(user.require_self_or_role(Uuid::now_v7(), &["admin"]).is_err());
    }

    #[test]
    fn test_non_uuid_subject_is_unauthorized() {
        assert!(matches!(
            AuthUser::try_from(&claims("not-a-uuid", "user")),
            Err(AppError::Unauthorized(_))
        ));
    }
}
