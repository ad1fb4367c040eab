//! Readiness endpoint

use axum::{Router, extract::State, response::IntoResponse, routing::get};
use axum_helpers::{HealthCheckFuture, run_health_checks};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(readiness_check))
        .with_state(state)
}

/// 200 when MongoDB answers a ping, 503 otherwise
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let mongodb: HealthCheckFuture = Box::pin(async move {
        if database::check_health(&state.mongo_client).await {
            Ok(())
        } else {
            Err("ping failed".to_string())
        }
    });

    run_health_checks(vec![("mongodb", mongodb)]).await
}
