//! Stateless HS256 authentication.
//!
//! [`JwtAuth`] issues short-lived access tokens and long-lived refresh tokens;
//! [`jwt_auth_middleware`] verifies the access token on protected routes and
//! [`AuthUser`] hands the verified identity to handlers.

mod config;
mod jwt;
mod middleware;
mod user;

pub use config::JwtConfig;
pub use jwt::{JwtAuth, JwtClaims, TokenError, TokenKind};
pub use middleware::{jwt_auth_middleware, optional_jwt_auth_middleware};
pub use user::AuthUser;
