//! Record id path parameter.

use crate::errors::{AppError, ErrorCode};
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

/// Parses the single `{id}` path segment of a route into a [`Uuid`].
///
/// A malformed id is rejected with 400 `Invalid ID format` before the
/// handler runs, so handlers only ever see well-formed ids.
///
/// ```ignore
/// async fn get_event(IdPath(id): IdPath) -> String {
///     id.to_string()
/// }
///
/// let app = Router::new().route("/{id}", get(get_event));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct IdPath(pub Uuid);

/// Parse a raw id string the same way [`IdPath`] does.
pub fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::InvalidId(ErrorCode::InvalidId.default_message().to_string()))
}

impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| e.into_response())?;

        parse_id(&raw).map(IdPath).map_err(|e| e.into_response())
    }
}
