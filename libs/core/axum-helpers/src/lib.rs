//! # Axum Helpers
//!
//! Shared HTTP plumbing for the event services.
//!
//! - **[`errors`]**: `AppError`, the single place where failures become status codes and JSON bodies
//! - **[`extractors`]**: validated JSON bodies, id path parameters, authenticated user
//! - **[`auth`]**: HS256 access/refresh tokens and the bearer-token middleware
//! - **[`http`]**: CORS and security headers
//! - **[`server`]**: router assembly with OpenAPI UIs, health endpoints, graceful shutdown
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::Router;
//! use axum_helpers::server::{RouterOptions, create_production_app, create_router};
//! use core_config::server::ServerConfig;
//! use utoipa::OpenApi;
//!
//! #[derive(OpenApi)]
//! #[openapi(paths())]
//! struct ApiDoc;
//!
//! let api_routes = Router::new();
//! let router = create_router::<ApiDoc>(api_routes, &RouterOptions::from_env()?)?;
//! create_production_app(router, &ServerConfig::default(), async {}).await?;
//! ```

pub mod auth;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use auth::{
    AuthUser, JwtAuth, JwtClaims, JwtConfig, TokenKind, jwt_auth_middleware,
    optional_jwt_auth_middleware,
};
pub use errors::{AppError, ErrorCode, ErrorResponse};
pub use extractors::{IdPath, ValidatedJson};
pub use http::{create_cors_layer, security_headers};
pub use server::{
    HealthCheckFuture, RouterOptions, ShutdownCoordinator, create_production_app, create_router,
    health_router, run_health_checks,
};
