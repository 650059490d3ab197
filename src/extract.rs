//! Request extractors whose rejections use the `AppError` body shape.

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// `Json<T>` that rejects bad bodies with a `Validation` error.
pub struct AppJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(error = %rejection.body_text(), "rejected json body");
        AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

/// Id taken from the path. Anything that is not a UUID cannot name a row,
/// so it is reported like a missing one.
pub fn resource_id(raw: &str, resource: &'static str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::NotFoundOrNotOwned(resource))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_uuid_ids_are_not_found() {
        assert!(matches!(
            resource_id("42", "Outfit"),
            Err(AppError::NotFoundOrNotOwned("Outfit"))
        ));
        let id = Uuid::new_v4();
        assert_eq!(resource_id(&id.to_string(), "Outfit").unwrap(), id);
    }
}
