//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use commerce::CommerceError;
use domain::DomainError;

use crate::response::ApiResponse;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request: unreadable body, bad path id, bad query string.
    BadRequest(String),
    /// Outcome of a storefront operation.
    Commerce(CommerceError),
}

impl ApiError {
    pub fn unauthorized() -> Self {
        ApiError::Commerce(CommerceError::Unauthorized)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Commerce(err) => commerce_status(err),
        }
    }
}

fn commerce_status(err: &CommerceError) -> StatusCode {
    match err {
        CommerceError::ValidationFailed(_)
        | CommerceError::EmptyCart
        | CommerceError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
        CommerceError::Unauthorized => StatusCode::UNAUTHORIZED,
        CommerceError::PaymentFailed(_) => StatusCode::PAYMENT_REQUIRED,
        CommerceError::Forbidden(_) => StatusCode::FORBIDDEN,
        CommerceError::NotFound { .. } => StatusCode::NOT_FOUND,
        CommerceError::DuplicateReview(_)
        | CommerceError::AlreadyExists(_)
        | CommerceError::InvalidTransition { .. } => StatusCode::CONFLICT,
        CommerceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Commerce(err) if status.is_server_error() => {
                tracing::error!(error = %err, "internal server error");
                "Internal server error".to_string()
            }
            ApiError::Commerce(err) => err.to_string(),
        };

        (status, ApiResponse::failure(message)).into_response()
    }
}

impl From<CommerceError> for ApiError {
    fn from(err: CommerceError) -> Self {
        ApiError::Commerce(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Commerce(err.into())
    }
}
