use super::shutdown::ShutdownCoordinator;
use crate::errors::handlers::not_found;
use crate::http::{create_cors_layer, parse_origins, security_headers};
use axum::{Router, http::HeaderValue, middleware};
use core_config::{ConfigError, FromEnv, env_or_default, env_required, server::ServerConfig};
use std::io;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;

/// Router-level settings.
///
/// Environment variables:
/// - `API_PREFIX` (default `/api/v1`): single mount point for every API router
/// - `CORS_ALLOWED_ORIGIN` (required): comma-separated list of browser origins
#[derive(Clone, Debug)]
pub struct RouterOptions {
    pub api_prefix: String,
    pub allowed_origins: Vec<HeaderValue>,
    pub request_timeout: Duration,
}

impl RouterOptions {
    pub fn new(api_prefix: impl Into<String>, allowed_origins: Vec<HeaderValue>) -> Self {
        Self {
            api_prefix: api_prefix.into(),
            allowed_origins,
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl FromEnv for RouterOptions {
    fn from_env() -> Result<Self, ConfigError> {
        let api_prefix = env_or_default("API_PREFIX", "/api/v1");
        if !api_prefix.starts_with('/') || api_prefix.ends_with('/') {
            return Err(ConfigError::ParseError {
                key: "API_PREFIX".to_string(),
                details: "must start with '/' and not end with '/'".to_string(),
            });
        }

        let raw = env_required("CORS_ALLOWED_ORIGIN")?;
        let allowed_origins = parse_origins(&raw).map_err(|details| ConfigError::ParseError {
            key: "CORS_ALLOWED_ORIGIN".to_string(),
            details,
        })?;

        Ok(Self::new(api_prefix, allowed_origins))
    }
}

/// Wraps the API routers with documentation and cross-cutting layers.
///
/// - `apis` mounted once under `options.api_prefix`
/// - Swagger UI `/swagger-ui`, Redoc `/redoc`, RapiDoc `/rapidoc`, Scalar `/scalar`,
///   spec at `/api-docs/openapi.json`
/// - JSON 404 fallback
/// - request tracing, security headers, CORS, timeout, compression
pub fn create_router<T>(apis: Router, options: &RouterOptions) -> io::Result<Router>
where
    T: OpenApi + 'static,
{
    use utoipa_rapidoc::RapiDoc;
    use utoipa_redoc::{Redoc, Servable as RedocServable};
    use utoipa_scalar::{Scalar, Servable as ScalarServable};
    use utoipa_swagger_ui::SwaggerUi;

    if options.allowed_origins.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "at least one CORS origin is required",
        ));
    }
    info!(
        prefix = %options.api_prefix,
        origins = options.allowed_origins.len(),
        "building router"
    );

    let router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", T::openapi()))
        .merge(Redoc::with_url("/redoc", T::openapi()))
        .merge(RapiDoc::new("/api-docs/openapi.json").path("/rapidoc"))
        .merge(Scalar::with_url("/scalar", T::openapi()))
        .nest(&options.api_prefix, apis)
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(middleware::from_fn(security_headers))
        .layer(create_cors_layer(options.allowed_origins.clone()))
        .layer(TimeoutLayer::new(options.request_timeout))
        .layer(CompressionLayer::new());

    Ok(router)
}

/// Serve `router` until SIGINT/SIGTERM, then run `cleanup` bounded by
/// `server_config.shutdown_timeout`.
pub async fn create_production_app<F>(
    router: Router,
    server_config: &ServerConfig,
    cleanup: F,
) -> io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let coordinator = ShutdownCoordinator::new();
    let shutdown_timeout = server_config.shutdown_timeout;

    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;
    info!("Server listening on {}", listener.local_addr()?);

    let signal_listener = coordinator.clone();
    tokio::spawn(async move { signal_listener.wait_for_signal().await });

    let mut cleanup_rx = coordinator.subscribe();
    let cleanup_handle = tokio::spawn(async move {
        let _ = cleanup_rx.recv().await;
        info!(?shutdown_timeout, "running cleanup");
        if tokio::time::timeout(shutdown_timeout, cleanup).await.is_err() {
            tracing::warn!(?shutdown_timeout, "cleanup timed out, forcing shutdown");
        } else {
            info!("cleanup completed");
        }
    });

    let serve_result = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(coordinator.clone().shutdown_requested())
        .await
        .inspect_err(|e| tracing::error!(error = ?e, "server error"));

    // Server may have stopped on its own; make sure cleanup still runs.
    coordinator.shutdown();
    cleanup_handle.await.ok();

    serve_result
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode, routing::get};
    use tower::ServiceExt;

    #[derive(OpenApi)]
    #[openapi(info(title = "test"))]
    struct EmptyDoc;

    fn options() -> RouterOptions {
        RouterOptions::new("/api/v1", vec![HeaderValue::from_static("http://localhost:3000")])
    }

    #[tokio::test]
    async fn test_apis_nested_under_prefix() {
        let apis = Router::new().route("/ping", get(|| async { "pong" }));
        let app = create_router::<EmptyDoc>(apis, &options()).unwrap();

        let response = app
            .clone()
            .oneshot(Request::get("/api/v1/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::get("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_openapi_document_served() {
        let app = create_router::<EmptyDoc>(Router::new(), &options()).unwrap();
        let response = app
            .oneshot(Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_empty_origins_rejected() {
        let options = RouterOptions::new("/api/v1", vec![]);
        assert!(create_router::<EmptyDoc>(Router::new(), &options).is_err());
    }

    #[test]
    fn test_options_from_env() {
        temp_env::with_vars(
            [
                ("API_PREFIX", None),
                ("CORS_ALLOWED_ORIGIN", Some("http://localhost:3000,http://localhost:5173")),
            ],
            || {
                let options = RouterOptions::from_env().unwrap();
                assert_eq!(options.api_prefix, "/api/v1");
                assert_eq!(options.allowed_origins.len(), 2);
            },
        );
    }

    #[test]
    fn test_options_reject_trailing_slash_prefix() {
        temp_env::with_vars(
            [("API_PREFIX", Some("/api/")), ("CORS_ALLOWED_ORIGIN", Some("http://x"))],
            || assert!(RouterOptions::from_env().is_err()),
        );
    }
}
