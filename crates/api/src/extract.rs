//! Request extractors that reject with the JSON envelope.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use common::UserId;
use domain::{Actor, Role};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The caller as asserted by the upstream identity provider.
///
/// `x-user-id` must carry a UUID; `x-user-role` is optional and defaults to
/// `user`. Anything else is a `401`.
#[derive(Debug, Clone, Copy)]
pub struct Identity(pub Actor);

impl Identity {
    fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let user_id = headers.get(USER_ID_HEADER)?.to_str().ok()?;
        let user_id = UserId::parse(user_id.trim()).ok()?;
        let role = match headers.get(USER_ROLE_HEADER) {
            Some(raw) => raw.to_str().ok()?.parse::<Role>().ok()?,
            None => Role::User,
        };
        Some(Identity(Actor { user_id, role }))
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Identity::from_headers(&parts.headers).ok_or_else(ApiError::unauthorized)
    }
}

/// `Json<T>` whose rejection is a `400` envelope.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
        }
    }
}

/// `Query<T>` whose rejection is a `400` envelope.
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| QueryParams(value))
            .map_err(|rejection: QueryRejection| ApiError::BadRequest(rejection.body_text()))
    }
}

/// Parses a path segment as one of the UUID identifiers.
pub fn parse_id<T: From<Uuid>>(raw: &str, entity: &str) -> Result<T, ApiError> {
    Uuid::parse_str(raw)
        .map(T::from)
        .map_err(|_| ApiError::BadRequest(format!("Invalid {entity} id: {raw}")))
}
