use super::jwt::{JwtAuth, TokenKind};
use crate::errors::AppError;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

/// Cookie name the web client stores the access token under.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Bearer token from `Authorization`, falling back to the `access_token` cookie.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| {
            CookieJar::from_headers(headers)
                .get(ACCESS_TOKEN_COOKIE)
                .map(|c| c.value().to_string())
        })
}

/// Rejects requests without a valid access token; on success the
/// [`JwtClaims`](super::JwtClaims) are placed in the request extensions.
///
/// ```ignore
/// let protected = Router::new()
///     .route("/", post(create_event))
///     .layer(axum::middleware::from_fn_with_state(jwt.clone(), jwt_auth_middleware));
/// ```
pub async fn jwt_auth_middleware(
    State(auth): State<JwtAuth>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(request.headers()).ok_or_else(|| {
        tracing::debug!("no bearer token or access_token cookie");
        AppError::Unauthorized("No token provided".to_string())
    })?;

    let claims = auth.verify(&token, TokenKind::Access).map_err(|e| {
        tracing::debug!(error = %e, "access token rejected");
        AppError::Unauthorized("Invalid or expired token".to_string())
    })?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Like [`jwt_auth_middleware`] but lets anonymous requests through.
pub async fn optional_jwt_auth_middleware(
    State(auth): State<JwtAuth>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_token(request.headers()) {
        if let Ok(claims) = auth.verify(&token, TokenKind::Access) {
            request.extensions_mut().insert(claims);
        }
    }

    next.run(request).await
}
