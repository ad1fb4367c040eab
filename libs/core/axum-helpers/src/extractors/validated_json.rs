//! JSON body extractor that runs `validator` rules before the handler.

use crate::errors::AppError;
use axum::{
    extract::{FromRequest, Json, Request},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// Deserializes the body as JSON, then calls [`Validate::validate`].
///
/// Both failures are 400 responses: a malformed body as `JSON_EXTRACTION`,
/// a rule violation as `VALIDATION_ERROR` with per-field `details`.
///
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct Login {
///     #[validate(length(min = 1))]
///     email: String,
/// }
///
/// async fn login(ValidatedJson(body): ValidatedJson<Login>) -> String {
///     body.email
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::from(e).into_response())?;

        data.validate()
            .map_err(|e| AppError::from(e).into_response())?;

        Ok(ValidatedJson(data))
    }
}
