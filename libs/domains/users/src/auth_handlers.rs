use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    AppError, ValidatedJson,
    errors::responses::{
        BadRequestResponse, InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::auth::AuthService;
use crate::models::{
    GoogleLoginRequest, LoginRequest, LoginResponse, MessageResponse, PasswordResetRequest,
    RefreshTokenRequest, ResetPasswordRequest, ResetPasswordResponse, SessionUser, TokenResponse,
};
use crate::repository::UserRepository;

/// OpenAPI documentation for the Auth API
#[derive(OpenApi)]
#[openapi(
    paths(
        login,
        refresh_token,
        request_password_reset,
        check_reset_token,
        reset_password,
        google_login
    ),
    components(
        schemas(
            LoginRequest,
            LoginResponse,
            SessionUser,
            RefreshTokenRequest,
            TokenResponse,
            PasswordResetRequest,
            ResetPasswordRequest,
            ResetPasswordResponse,
            GoogleLoginRequest,
            MessageResponse
        ),
        responses(
            BadRequestResponse,
            NotFoundResponse,
            UnauthorizedResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Auth", description = "Sessions, token refresh and password recovery")
    )
)]
pub struct ApiDoc;

pub fn router<R: UserRepository + 'static>(service: AuthService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token))
        .route("/request-password-reset", post(request_password_reset))
        .route(
            "/reset-password/{token}",
            get(check_reset_token).post(reset_password),
        )
        .route("/google-login", post(google_login))
        .with_state(shared_service)
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access and refresh tokens", body = LoginResponse),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn login<R: UserRepository>(
    State(service): State<Arc<AuthService<R>>>,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    Ok(Json(service.login(&input.email, &input.password).await?))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/refresh-token",
    tag = "Auth",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New access token", body = TokenResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn refresh_token<R: UserRepository>(
    State(service): State<Arc<AuthService<R>>>,
    ValidatedJson(input): ValidatedJson<RefreshTokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    Ok(Json(service.refresh(&input.refresh_token).await?))
}

/// Email a password reset link
#[utoipa::path(
    post,
    path = "/request-password-reset",
    tag = "Auth",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset link sent", body = MessageResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn request_password_reset<R: UserRepository>(
    State(service): State<Arc<AuthService<R>>>,
    ValidatedJson(input): ValidatedJson<PasswordResetRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    service.request_password_reset(&input.email).await?;
    Ok(Json(MessageResponse::new("Password reset link sent")))
}

/// Follow an emailed reset link; redirects to the client's new-password page
#[utoipa::path(
    get,
    path = "/reset-password/{token}",
    tag = "Auth",
    params(
        ("token" = String, Path, description = "Reset token from the email")
    ),
    responses(
        (status = 302, description = "Redirect to the client's new-password page"),
        (status = 400, response = BadRequestResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn check_reset_token<R: UserRepository>(
    State(service): State<Arc<AuthService<R>>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let location = service.check_reset_token(&token).await?;
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]))
}

/// Set a new password using a reset token
#[utoipa::path(
    post,
    path = "/reset-password/{token}",
    tag = "Auth",
    params(
        ("token" = String, Path, description = "Reset token from the email")
    ),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ResetPasswordResponse),
        (status = 400, response = BadRequestResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn reset_password<R: UserRepository>(
    State(service): State<Arc<AuthService<R>>>,
    Path(token): Path<String>,
    ValidatedJson(input): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<ResetPasswordResponse>, AppError> {
    Ok(Json(service.reset_password(&token, &input.new_password).await?))
}

/// Sign in with a Google ID token
#[utoipa::path(
    post,
    path = "/google-login",
    tag = "Auth",
    request_body = GoogleLoginRequest,
    responses(
        (status = 200, description = "Access and refresh tokens", body = LoginResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn google_login<R: UserRepository>(
    State(service): State<Arc<AuthService<R>>>,
    ValidatedJson(input): ValidatedJson<GoogleLoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    Ok(Json(service.google_login(&input.id_token).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthConfig;
    use crate::models::{Role, User};
    use crate::password::{hash_password, token_digest};
    use crate::repository::InMemoryUserRepository;
    use axum::body::Body;
    use axum::http::Request;
    use axum_helpers::{JwtAuth, JwtConfig};
    use chrono::{Duration, Utc};
    use email::{Mailer, MailerConfig, MockEmailProvider};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        repo: Arc<InMemoryUserRepository>,
        outbox: MockEmailProvider,
    }

    async fn app() -> TestApp {
        let repo = Arc::new(InMemoryUserRepository::new());
        let outbox = MockEmailProvider::new();
        let mailer = Mailer::new(Arc::new(outbox.clone()), MailerConfig::default()).unwrap();
        let jwt = JwtAuth::new(&JwtConfig::new("auth-handler-test-secret-of-32-chars").unwrap());
        let service = AuthService::new(
            Arc::clone(&repo),
            jwt,
            mailer,
            AuthConfig::new("http://localhost:3000"),
        );

        let hash = hash_password("Password123!").unwrap();
        repo.create(User::new(
            "John".into(),
            "john@example.com".into(),
            Some(hash),
            Role::User,
        ))
        .await
        .unwrap();

        TestApp {
            router: router(service),
            repo,
            outbox,
        }
    }

    async fn post_json(app: &TestApp, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_login_response_shape() {
        let app = app().await;
        let (status, body) = post_json(
            &app,
            "/login",
            json!({"email": "john@example.com", "password": "Password123!"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].is_string());
        assert!(body["refreshToken"].is_string());
        assert_eq!(body["user"]["email"], "john@example.com");
        assert_eq!(body["user"]["role"], "user");
    }

    #[tokio::test]
    async fn test_login_errors() {
        let app = app().await;

        let (status, body) = post_json(
            &app,
            "/login",
            json!({"email": "nobody@example.com", "password": "Password123!"}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "User not found");

        let (status, body) = post_json(
            &app,
            "/login",
            json!({"email": "john@example.com", "password": "Wrong1234"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid email or password");
    }

    #[tokio::test]
    async fn test_refresh_roundtrip_and_rejection() {
        let app = app().await;
        let (_, login) = post_json(
            &app,
            "/login",
            json!({"email": "john@example.com", "password": "Password123!"}),
        )
        .await;

        let (status, body) = post_json(
            &app,
            "/refresh-token",
            json!({"refreshToken": login["refreshToken"]}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].is_string());

        let (status, _) = post_json(&app, "/refresh-token", json!({"refreshToken": login["token"]}))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_request_password_reset_sends_mail() {
        let app = app().await;
        let (status, body) = post_json(
            &app,
            "/request-password-reset",
            json!({"email": "john@example.com"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Password reset link sent");
        let mail = app.outbox.last_sent_to("john@example.com").await.unwrap();
        assert_eq!(mail.subject, "Password Reset Request");

        let (status, _) = post_json(
            &app,
            "/request-password-reset",
            json!({"email": "ghost@example.com"}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reset_link_redirects_then_resets() {
        let app = app().await;
        let mut user = app.repo.get_by_email("john@example.com").await.unwrap().unwrap();
        user.reset_token = Some(token_digest("known-token"));
        user.reset_token_expiration = Some(Utc::now() + Duration::minutes(30));
        app.repo.update(user).await.unwrap();

        let response = app
            .router
            .clone()
            .oneshot(
                Request::get("/reset-password/known-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            "http://localhost:3000/new-password/known-token"
        );

        let (status, body) = post_json(
            &app,
            "/reset-password/known-token",
            json!({"newPassword": "BrandNew123"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Password reset successful");
        assert_eq!(body["user"]["email"], "john@example.com");
    }

    #[tokio::test]
    async fn test_unknown_reset_token_is_400() {
        let app = app().await;
        let response = app
            .router
            .clone()
            .oneshot(Request::get("/reset-password/bogus").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Invalid or expired token");
    }
}
