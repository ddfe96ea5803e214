use crate::error::PawgateError;
use axum::{extract::Request, Json};
use serde::Deserialize;
use validator::Validate;

/// JSON extractor that validates the body after deserializing.
///
/// Rejections surface as 400 `ValidationError` responses listing the failed
/// fields.
pub struct ValidatedJson<T>(pub T);

impl<T, S> axum::extract::FromRequest<S> for ValidatedJson<T>
where
    T: for<'de> Deserialize<'de> + Validate + Send,
    S: Send + Sync,
{
    type Rejection = PawgateError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let json: Json<T> = Json::from_request(req, state)
            .await
            .map_err(|e| PawgateError::bad_request(format!("Invalid JSON: {}", e)))?;

        json.0.validate()?;

        Ok(ValidatedJson(json.0))
    }
}
