use mongodb::{Client, bson::doc, options::ClientOptions};
use tracing::{info, instrument};

use crate::MongoConfig;
use crate::retry::{RetryConfig, retry_with_backoff};

#[derive(Debug, thiserror::Error)]
pub enum MongoError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
}

/// Build a client from `config` and verify it with a `ping` on the admin database.
#[instrument(skip(config), fields(url = %config.redacted_url(), database = %config.database))]
pub async fn connect(config: &MongoConfig) -> Result<Client, MongoError> {
    let mut options = ClientOptions::parse(&config.url).await?;
    options.max_pool_size = Some(config.max_pool_size);
    options.min_pool_size = Some(config.min_pool_size);
    options.connect_timeout = Some(config.connect_timeout);
    options.server_selection_timeout = Some(config.server_selection_timeout);
    if let Some(ref app_name) = config.app_name {
        options.app_name = Some(app_name.clone());
    }

    let client = Client::with_options(options)?;
    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(|e| MongoError::ConnectionFailed(e.to_string()))?;

    info!("connected to MongoDB");
    Ok(client)
}

/// [`connect`] with exponential backoff, for startup against a database that may still be booting.
pub async fn connect_with_retry(
    config: &MongoConfig,
    retry: RetryConfig,
) -> Result<Client, MongoError> {
    retry_with_backoff(|| connect(config), retry).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_rejects_malformed_url() {
        let config = MongoConfig::new("not-a-mongo-url", "x");
        let err = connect(&config).await.unwrap_err();
        assert!(matches!(err, MongoError::Mongo(_)));
    }

    #[tokio::test]
    #[ignore] // Requires Docker
    async fn test_connect_to_container() {
        let mongo = test_utils::TestMongo::new().await;
        let config = MongoConfig::new(mongo.connection_string(), "connector_test");
        let client = connect_with_retry(&config, RetryConfig::default()).await;
        assert!(client.is_ok());
    }
}
