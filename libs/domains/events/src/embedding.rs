//! Text embeddings for event summaries.

use async_trait::async_trait;
use core_config::{ConfigError, env_or_default, env_required};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

use crate::error::{EventError, EventResult};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "text-embedding-3-small";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> EventResult<Vec<f32>>;
}

/// OpenAI-compatible embeddings endpoint configuration
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Reads `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `OPENAI_EMBEDDING_MODEL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: env_required("OPENAI_API_KEY")?,
            base_url: env_or_default("OPENAI_BASE_URL", DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            model: env_or_default("OPENAI_EMBEDDING_MODEL", DEFAULT_MODEL),
        })
    }
}

pub struct OpenAiEmbedder {
    client: Client,
    config: OpenAiConfig,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(config: OpenAiConfig) -> EventResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| EventError::Internal(format!("http client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(OpenAiConfig::from_env()?).map_err(|e| ConfigError::ParseError {
            key: "OPENAI_API_KEY".to_string(),
            details: e.to_string(),
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    #[instrument(skip(self, text), fields(model = %self.config.model, chars = text.len()))]
    async fn embed(&self, text: &str) -> EventResult<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.config.model,
            input: vec![text],
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| EventError::Embedding(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EventError::Embedding(format!(
                "embeddings API returned {status}: {body}"
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EventError::Embedding(format!("unexpected response: {e}")))?;

        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| EventError::Embedding("No embedding returned".to_string()))
    }
}

/// Cosine similarity; 0 when either vector is empty or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::HeaderMap, http::StatusCode, routing::post};
    use serde_json::{Value, json};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    #[tokio::test]
    async fn test_embed_posts_model_and_input() {
        async fn handler(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
            assert_eq!(headers["authorization"], "Bearer sk-test");
            assert_eq!(body["model"], "text-embedding-3-small");
            assert_eq!(body["input"][0], "hello");
            Json(json!({"data": [{"embedding": [0.5, -0.25], "index": 0}]}))
        }
        let base = serve(Router::new().route("/v1/embeddings", post(handler))).await;
        let embedder = OpenAiEmbedder::new(OpenAiConfig::new("sk-test").with_base_url(base)).unwrap();

        assert_eq!(embedder.embed("hello").await.unwrap(), vec![0.5, -0.25]);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_embedding_error() {
        let base = serve(Router::new().route(
            "/v1/embeddings",
            post(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
        ))
        .await;
        let embedder = OpenAiEmbedder::new(OpenAiConfig::new("x").with_base_url(base)).unwrap();

        let err = embedder.embed("hello").await.unwrap_err();
        assert!(matches!(err, EventError::Embedding(m) if m.contains("401")));
    }

    #[test]
    fn test_config_from_env() {
        temp_env::with_vars(
            [
                ("OPENAI_API_KEY", Some("sk-env")),
                ("OPENAI_BASE_URL", Some("http://localhost:8080/v1/")),
                ("OPENAI_EMBEDDING_MODEL", None),
            ],
            || {
                let config = OpenAiConfig::from_env().unwrap();
                assert_eq!(config.base_url, "http://localhost:8080/v1");
                assert_eq!(config.model, DEFAULT_MODEL);
            },
        );
        temp_env::with_var_unset("OPENAI_API_KEY", || {
            assert!(OpenAiConfig::from_env().is_err());
        });
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-9);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }
}
