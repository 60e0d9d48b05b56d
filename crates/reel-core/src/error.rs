use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::service::CatalogError;
use crate::store::StoreError;

/// Message returned for failures whose detail stays server-side.
pub const GENERIC_MESSAGE: &str = "Something went wrong";

/// The only error type handlers return.
///
/// Converting an `ApiError` into a response is the single place where an
/// error becomes a status code and a JSON body, so every route fails with
/// the same envelope:
///
/// ```json
/// { "success": false, "statusCode": 400, "message": "year: must be between 1888 and 2100" }
/// ```
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    /// Unknown route. A missing movie is not an error; see [`CatalogError`].
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    MethodNotAllowed(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl ApiError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) | ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to the client. Server errors never leak detail.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Internal(_) | ApiError::Storage(_) => GENERIC_MESSAGE.to_string(),
            other => {
                let message = other.to_string();
                if message.is_empty() {
                    GENERIC_MESSAGE.to_string()
                } else {
                    message
                }
            }
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::InvalidInput(message) => ApiError::BadRequest(message),
            CatalogError::Storage(e) => ApiError::Storage(e),
        }
    }
}

/// Error body shared by every route.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
}

impl ErrorEnvelope {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        ErrorEnvelope {
            success: false,
            status_code: status.as_u16(),
            message: message.into(),
        }
    }
}

impl IntoResponse for ErrorEnvelope {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, axum::Json(self)).into_response()
    }
}

/// Plain `{ "message": ... }` body used by not-found and delete responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}

/// Field-level validation error.
///
/// ```json
/// {
///   "field": "poster",
///   "message": "must be a valid URL",
///   "code": "url"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl FieldError {
    /// Create a new field error with a code.
    pub fn with_code(
        field: impl Into<String>,
        message: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
            code: Some(code.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected ({}): {}", status.as_u16(), self);
        }
        ErrorEnvelope::new(status, self.public_message()).into_response()
    }
}
