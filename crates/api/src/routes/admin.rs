//! Administration endpoints. The admin check itself lives in the services.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use commerce::Dashboard;
use common::{OrderId, ProductId};
use domain::{Order, OrderStatus, Product, ProductDraft, User};
use serde::Deserialize;
use store::Store;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{Identity, JsonBody, parse_id};
use crate::response::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// GET /admin/dashboard
#[tracing::instrument(skip(state))]
pub async fn dashboard<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
) -> Result<ApiResponse<Dashboard>, ApiError> {
    let dashboard = state.commerce.admin.dashboard(&actor).await?;
    Ok(ApiResponse::ok(dashboard))
}

/// GET /admin/users
#[tracing::instrument(skip(state))]
pub async fn users<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
) -> Result<ApiResponse<Vec<User>>, ApiError> {
    let users = state.commerce.admin.list_users(&actor).await?;
    Ok(ApiResponse::list(users))
}

/// GET /admin/orders
#[tracing::instrument(skip(state))]
pub async fn orders<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
) -> Result<ApiResponse<Vec<Order>>, ApiError> {
    let orders = state.commerce.admin.list_orders(&actor).await?;
    Ok(ApiResponse::list(orders))
}

/// PUT /admin/orders/{id}
#[tracing::instrument(skip(state, req))]
pub async fn update_order_status<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateStatusRequest>,
) -> Result<ApiResponse<Order>, ApiError> {
    let id: OrderId = parse_id(&id, "order")?;
    let status: OrderStatus = req.status.parse()?;
    let order = state
        .commerce
        .admin
        .update_order_status(&actor, id, status)
        .await?;
    Ok(ApiResponse::ok(order).with_message("Order status updated"))
}

/// POST /admin/products
#[tracing::instrument(skip(state, draft))]
pub async fn create_product<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    JsonBody(draft): JsonBody<ProductDraft>,
) -> Result<(StatusCode, ApiResponse<Product>), ApiError> {
    let product = state.commerce.admin.create_product(&actor, draft).await?;
    Ok(ApiResponse::ok(product).created())
}

/// PUT /admin/products/{id}
#[tracing::instrument(skip(state, draft))]
pub async fn update_product<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Path(id): Path<String>,
    JsonBody(draft): JsonBody<ProductDraft>,
) -> Result<ApiResponse<Product>, ApiError> {
    let id: ProductId = parse_id(&id, "product")?;
    let product = state
        .commerce
        .admin
        .update_product(&actor, id, draft)
        .await?;
    Ok(ApiResponse::ok(product))
}

/// DELETE /admin/products/{id}
#[tracing::instrument(skip(state))]
pub async fn delete_product<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>, ApiError> {
    let id: ProductId = parse_id(&id, "product")?;
    state.commerce.admin.delete_product(&actor, id).await?;
    Ok(ApiResponse::message("Product deleted"))
}
