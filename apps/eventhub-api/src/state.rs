//! Shared application state.

use mongodb::{Client, Database};

/// Cloned into every router that needs it; the Mongo handles share one pool.
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    pub mongo_client: Client,
    pub db: Database,
}
