//! MongoDB connectivity for the event services.
//!
//! ```ignore
//! use core_config::FromEnv;
//! use database::{MongoConfig, RetryConfig, connect_with_retry};
//!
//! let config = MongoConfig::from_env()?;
//! let client = connect_with_retry(&config, RetryConfig::default()).await?;
//! let db = client.database(config.database());
//! ```

mod codec;
mod config;
mod connector;
mod errors;
mod health;
mod indexes;
mod pagination;
pub mod retry;

pub use codec::stored_bson;
pub use config::MongoConfig;
pub use connector::{MongoError, connect, connect_with_retry};
pub use errors::is_duplicate_key;
pub use health::{HealthStatus, check_health, check_health_detailed};
pub use indexes::{IndexSpec, ensure_indexes};
pub use pagination::page_skip;
pub use retry::{RetryConfig, retry_with_backoff};

pub use mongodb::{Client, Collection, Database};
