//! Request extractors

use crate::error::ApiError;
use axum::{
    extract::{FromRequest, Request},
    Json,
};
use customer_identity_shared::RequestValidation;
use serde::de::DeserializeOwned;

/// JSON body that has been deserialized and then validated.
///
/// Unparseable bodies are rejected as `BAD_REQUEST`, rule violations as
/// `VALIDATION_FAILED`.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + RequestValidation,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        value.validate().map_err(ApiError::Validation)?;

        Ok(ValidatedJson(value))
    }
}
