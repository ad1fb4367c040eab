//! Address → coordinates resolution.

use async_trait::async_trait;
use core_config::{ConfigError, env_required};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

use crate::error::{LocationError, LocationResult};
use crate::models::Coordinates;

const OPENCAGE_URL: &str = "https://api.opencagedata.com/geocode/v1/json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Coordinates of the best match for a free-text address.
    async fn geocode(&self, address: &str) -> LocationResult<Coordinates>;
}

/// OpenCage forward geocoding
pub struct OpenCageGeocoder {
    client: Client,
    api_key: String,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct OpenCageResponse {
    #[serde(default)]
    results: Vec<OpenCageResult>,
}

#[derive(Debug, Deserialize)]
struct OpenCageResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    lat: f64,
    lng: f64,
}

impl OpenCageGeocoder {
    pub fn new(api_key: impl Into<String>) -> LocationResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LocationError::Internal(format!("http client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: OPENCAGE_URL.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Reads `OPENCAGE_API_KEY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env_required("OPENCAGE_API_KEY")?;
        Self::new(api_key).map_err(|e| ConfigError::ParseError {
            key: "OPENCAGE_API_KEY".to_string(),
            details: e.to_string(),
        })
    }
}

#[async_trait]
impl Geocoder for OpenCageGeocoder {
    #[instrument(skip(self))]
    async fn geocode(&self, address: &str) -> LocationResult<Coordinates> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", address),
                ("key", self.api_key.as_str()),
                ("limit", "1"),
                ("no_annotations", "1"),
            ])
            .send()
            .await
            .map_err(|e| LocationError::Geocoding(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LocationError::Geocoding(format!("OpenCage returned {status}: {body}")));
        }

        let body: OpenCageResponse = response
            .json()
            .await
            .map_err(|e| LocationError::Geocoding(format!("unexpected response: {e}")))?;

        let first = body.results.into_iter().next().ok_or_else(|| {
            LocationError::Geocoding("No results found for the provided address".to_string())
        })?;

        tracing::debug!(lat = first.geometry.lat, lng = first.geometry.lng, "address geocoded");
        Ok(Coordinates {
            latitude: first.geometry.lat,
            longitude: first.geometry.lng,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, extract::Query, http::StatusCode, routing::get};
    use serde_json::{Value, json};
    use std::collections::HashMap;

    /// Serve `router` on an ephemeral port and return its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/geocode")
    }

    #[tokio::test]
    async fn test_first_result_wins() {
        async fn handler(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
            assert_eq!(params["key"], "k3y");
            assert_eq!(params["q"], "Helsinki, Finland");
            Json(json!({
                "results": [
                    {"geometry": {"lat": 60.1699, "lng": 24.9384}},
                    {"geometry": {"lat": 0.0, "lng": 0.0}}
                ]
            }))
        }
        let url = serve(Router::new().route("/geocode", get(handler))).await;
        let geocoder = OpenCageGeocoder::new("k3y").unwrap().with_endpoint(url);

        let coords = geocoder.geocode("Helsinki, Finland").await.unwrap();
        assert_eq!(coords.latitude, 60.1699);
        assert_eq!(coords.longitude, 24.9384);
    }

    #[tokio::test]
    async fn test_no_results_is_geocoding_error() {
        let url = serve(Router::new().route(
            "/geocode",
            get(|| async { Json(json!({"results": []})) }),
        ))
        .await;
        let geocoder = OpenCageGeocoder::new("k").unwrap().with_endpoint(url);

        let err = geocoder.geocode("Nowhere").await.unwrap_err();
        assert!(matches!(err, LocationError::Geocoding(_)));
    }

    #[tokio::test]
    async fn test_upstream_error_status() {
        let url = serve(Router::new().route(
            "/geocode",
            get(|| async { (StatusCode::PAYMENT_REQUIRED, "quota exceeded") }),
        ))
        .await;
        let geocoder = OpenCageGeocoder::new("k").unwrap().with_endpoint(url);

        let err = geocoder.geocode("Helsinki").await.unwrap_err();
        assert!(matches!(err, LocationError::Geocoding(m) if m.contains("402")));
    }

    #[test]
    fn test_from_env_requires_key() {
        temp_env::with_var_unset("OPENCAGE_API_KEY", || {
            assert!(matches!(
                OpenCageGeocoder::from_env(),
                Err(ConfigError::MissingEnvVar(_))
            ));
        });
    }
}
