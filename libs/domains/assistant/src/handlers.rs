use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::post,
};
use axum_helpers::{
    AppError,
    errors::responses::{BadRequestResponse, InternalServerErrorResponse, NotFoundResponse},
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::models::{ChatRequest, StartThreadResponse, ThreadReply};
use crate::repository::ThreadStore;
use crate::service::AssistantService;

/// OpenAPI documentation for the recommendation chat
#[derive(OpenApi)]
#[openapi(
    paths(start_thread, continue_thread),
    components(
        schemas(ChatRequest, StartThreadResponse, ThreadReply),
        responses(BadRequestResponse, NotFoundResponse, InternalServerErrorResponse)
    ),
    tags(
        (name = "Assistant", description = "Event recommendation chat")
    )
)]
pub struct ApiDoc;

pub fn router<S: ThreadStore + 'static>(service: AssistantService<S>) -> Router {
    Router::new()
        .route("/", post(start_thread))
        .route("/{thread_id}", post(continue_thread))
        .with_state(Arc::new(service))
}

/// Start a recommendation chat
#[utoipa::path(
    post,
    path = "",
    tag = "Assistant",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "New thread and the first reply", body = StartThreadResponse),
        (status = 400, response = BadRequestResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn start_thread<S: ThreadStore>(
    State(service): State<Arc<AssistantService<S>>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<StartThreadResponse>, AppError> {
    let Json(request) = payload?;
    Ok(Json(service.start_thread(request.message).await?))
}

/// Continue a recommendation chat
#[utoipa::path(
    post,
    path = "/{thread_id}",
    tag = "Assistant",
    params(("thread_id" = String, Path, description = "Thread returned by the first call")),
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Reply", body = ThreadReply),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn continue_thread<S: ThreadStore>(
    State(service): State<Arc<AssistantService<S>>>,
    Path(thread_id): Path<String>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ThreadReply>, AppError> {
    let Json(request) = payload?;
    Ok(Json(
        service.continue_thread(&thread_id, request.message).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::error::AssistantError;
    use crate::model::{MockChatModel, ModelReply};
    use crate::repository::InMemoryThreadStore;
    use crate::tools::ToolRegistry;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app(model: MockChatModel) -> Router {
        let agent = Agent::new(Arc::new(model), Arc::new(ToolRegistry::new()));
        router(AssistantService::new(InMemoryThreadStore::new(), agent))
    }

    fn greeter() -> MockChatModel {
        let mut model = MockChatModel::new();
        model
            .expect_complete()
            .returning(|_, _| Ok(ModelReply::text("THOUGHT: greet\n===\nHello! 🎉")));
        model
    }

    async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_start_then_continue() {
        let router = app(greeter());

        let (status, body) = post_json(&router, "/", json!({"message": "hi"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "Hello! 🎉");
        let thread_id = body["threadId"].as_str().unwrap().to_string();

        let (status, body) =
            post_json(&router, &format!("/{thread_id}"), json!({"message": "again"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "Hello! 🎉");
        assert!(body.get("threadId").is_none());
    }

    #[tokio::test]
    async fn test_missing_message_is_bad_request() {
        let router = app(MockChatModel::new());

        let (status, body) = post_json(&router, "/", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Message is required");
    }

    #[tokio::test]
    async fn test_unknown_thread_is_not_found() {
        let router = app(MockChatModel::new());

        let (status, body) = post_json(&router, "/0190-missing", json!({"message": "hi"})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Thread not found");
    }

    #[tokio::test]
    async fn test_model_failure_is_internal_error() {
        let mut model = MockChatModel::new();
        model
            .expect_complete()
            .returning(|_, _| Err(AssistantError::Model("quota".into())));
        let router = app(model);

        let (status, body) = post_json(&router, "/", json!({"message": "hi"})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Failed to process chat");
    }
}
