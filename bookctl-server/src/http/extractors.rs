//! Custom Axum extractors

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use super::error::ApiError;

/// Extract a book id from the path.
///
/// Anything that is not a positive integer is answered as "not found",
/// the same way the repository treats ids below 1.
pub struct BookId(pub i64);

impl<S> FromRequestParts<S> for BookId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let not_found = |id: String| ApiError::NotFound {
            resource: "book",
            id,
        };

        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| not_found(String::new()))?;

        match raw.parse::<i64>() {
            Ok(id) if id >= 1 => Ok(Self(id)),
            _ => Err(not_found(raw)),
        }
    }
}

/// JSON body whose rejections are reported as JSON `bad_request` errors.
///
/// Deserialization messages pass through, so a malformed `pages` value
/// surfaces as "invalid pages format".
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| ApiError::BadRequest {
                message: rejection.body_text(),
            })?;
        Ok(Self(value))
    }
}
