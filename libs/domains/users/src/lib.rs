//! Users Domain
//!
//! User accounts and the authentication flows built on them.
//!
//! # Features
//!
//! - User CRUD with paginated listing
//! - Password hashing with Argon2, password change with current-password check
//! - Access/refresh token issuance and refresh
//! - Password reset by emailed, time-boxed token
//! - Google sign-in (ID token verification, account linking)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ handlers / auth_handlers     │  ← HTTP endpoints
//! └──────┬───────────────┬───────┘
//!        │               │
//! ┌──────▼──────┐ ┌──────▼──────┐
//! │ UserService │ │ AuthService │  ← validation, hashing, tokens, mail
//! └──────┬──────┘ └──────┬──────┘
//!        └───────┬───────┘
//!         ┌──────▼──────┐
//!         │ Repository  │  ← trait + in-memory and MongoDB implementations
//!         └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_users::{handlers, InMemoryUserRepository, UserService};
//!
//! let service = UserService::new(InMemoryUserRepository::new());
//! let router = handlers::router(service, jwt_auth);
//! ```

pub mod auth;
pub mod auth_handlers;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod mongodb;
pub mod password;
pub mod repository;
pub mod service;
pub mod validation;

pub use auth::{AuthConfig, AuthService};
pub use error::{UserError, UserResult};
pub use identity::{ExternalIdentity, GoogleIdentityVerifier, IdentityVerifier};
pub use models::{CreateUser, Role, UpdateUser, User, UserFilter, UserList, UserResponse};
pub use mongodb::MongoUserRepository;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::UserService;
