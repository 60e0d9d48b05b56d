use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON extractor and response wrapper.
///
/// Unlike `axum::Json` it does not insist on a `Content-Type` header, and
/// every rejection is an [`ApiError`], so malformed bodies get the same
/// error envelope as any other bad request. The body size cap comes from
/// the router's `DefaultBodyLimit`.
///
/// ```rust,ignore
/// async fn create_movie(Json(body): Json<serde_json::Value>) -> Result<impl IntoResponse, ApiError> {
///     // body is any well-formed JSON document
/// }
/// ```
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::PayloadTooLarge("Request body is too large".to_string())
            } else {
                ApiError::BadRequest(format!("Failed to read body: {}", rejection.body_text()))
            }
        })?;

        let value: T = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::BadRequest(format!("Invalid JSON: {}", e)))?;

        Ok(Json(value))
    }
}

impl<T: serde::Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(bytes) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                bytes,
            )
                .into_response(),
            Err(e) => ApiError::Internal(format!("Failed to encode response: {}", e)).into_response(),
        }
    }
}
