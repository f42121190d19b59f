//! Checkout and the caller's orders.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use commerce::CheckoutRequest;
use common::OrderId;
use domain::Order;
use store::Store;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{Identity, JsonBody, parse_id};
use crate::response::ApiResponse;

/// POST /orders: checks out the caller's cart.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    JsonBody(req): JsonBody<CheckoutRequest>,
) -> Result<(StatusCode, ApiResponse<Order>), ApiError> {
    let order = state.commerce.checkout.checkout(&actor, req).await?;
    tracing::info!(order_id = %order.id, "order placed");
    Ok(ApiResponse::ok(order)
        .with_message("Order placed successfully")
        .created())
}

/// GET /orders
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
) -> Result<ApiResponse<Vec<Order>>, ApiError> {
    let orders = state.commerce.orders.list_my_orders(&actor).await?;
    Ok(ApiResponse::list(orders))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Path(id): Path<String>,
) -> Result<ApiResponse<Order>, ApiError> {
    let id: OrderId = parse_id(&id, "order")?;
    let order = state.commerce.orders.get_order(&actor, id).await?;
    Ok(ApiResponse::ok(order))
}

/// PUT /orders/{id}/cancel
#[tracing::instrument(skip(state))]
pub async fn cancel<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Path(id): Path<String>,
) -> Result<ApiResponse<Order>, ApiError> {
    let id: OrderId = parse_id(&id, "order")?;
    let order = state.commerce.orders.cancel_order(&actor, id).await?;
    Ok(ApiResponse::ok(order).with_message("Order cancelled"))
}
