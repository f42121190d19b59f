//! Registration and the caller's own profile.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use domain::{ProfileUpdate, User};
use serde::Deserialize;
use store::Store;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{Identity, JsonBody};
use crate::response::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
}

/// POST /users
#[tracing::instrument(skip(state, req))]
pub async fn register<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, ApiResponse<User>), ApiError> {
    let user = state.commerce.users.register(&req.name, &req.email).await?;
    Ok(ApiResponse::ok(user).created())
}

/// GET /users/me
#[tracing::instrument(skip(state))]
pub async fn me<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
) -> Result<ApiResponse<User>, ApiError> {
    let user = state.commerce.users.get_profile(&actor).await?;
    Ok(ApiResponse::ok(user))
}

/// PUT /users/me
#[tracing::instrument(skip(state, update))]
pub async fn update_me<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> Result<ApiResponse<User>, ApiError> {
    let user = state.commerce.users.update_profile(&actor, update).await?;
    Ok(ApiResponse::ok(user).with_message("Profile updated"))
}
