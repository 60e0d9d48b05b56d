use axum::{
    extract::{FromRequestParts, Query as AxumQuery},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Query-string extractor whose rejection is an [`ApiError`].
///
/// A query string that does not fit `T` (a repeated key, a wrong type)
/// is answered with the 400 error envelope instead of axum's plain-text
/// rejection.
///
/// ```rust,ignore
/// async fn list_movies(Query(query): Query<GenreQuery>) -> Result<Json<Vec<Movie>>, ApiError> {
///     // query.genre is None when `?genre=` is absent
/// }
/// ```
pub struct Query<T>(pub T);

impl<S, T> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AxumQuery(value) = AxumQuery::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                ApiError::BadRequest(format!("Invalid query string: {}", rejection.body_text()))
            })?;
        Ok(Query(value))
    }
}
