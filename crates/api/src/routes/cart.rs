//! The caller's shopping cart.

use std::sync::Arc;

use axum::extract::{Path, State};
use common::ProductId;
use domain::CartView;
use serde::Deserialize;
use store::Store;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{Identity, JsonBody, parse_id};
use crate::response::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    #[serde(default = "one")]
    pub quantity: i64,
}

fn one() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

/// GET /cart
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
) -> Result<ApiResponse<CartView>, ApiError> {
    let cart = state.commerce.carts.get_cart(&actor).await?;
    Ok(ApiResponse::ok(cart))
}

/// POST /cart
#[tracing::instrument(skip(state, req))]
pub async fn add<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    JsonBody(req): JsonBody<AddItemRequest>,
) -> Result<ApiResponse<CartView>, ApiError> {
    let product_id: ProductId = parse_id(&req.product_id, "product")?;
    let cart = state
        .commerce
        .carts
        .add_item(&actor, product_id, req.quantity)
        .await?;
    Ok(ApiResponse::ok(cart).with_message("Item added to cart"))
}

/// PUT /cart/{product_id}
#[tracing::instrument(skip(state, req))]
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Path(product_id): Path<String>,
    JsonBody(req): JsonBody<UpdateItemRequest>,
) -> Result<ApiResponse<CartView>, ApiError> {
    let product_id: ProductId = parse_id(&product_id, "product")?;
    let cart = state
        .commerce
        .carts
        .update_item(&actor, product_id, req.quantity)
        .await?;
    Ok(ApiResponse::ok(cart))
}

/// DELETE /cart/{product_id}
#[tracing::instrument(skip(state))]
pub async fn remove<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Path(product_id): Path<String>,
) -> Result<ApiResponse<CartView>, ApiError> {
    let product_id: ProductId = parse_id(&product_id, "product")?;
    let cart = state.commerce.carts.remove_item(&actor, product_id).await?;
    Ok(ApiResponse::ok(cart).with_message("Item removed from cart"))
}

/// DELETE /cart
#[tracing::instrument(skip(state))]
pub async fn clear<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
) -> Result<ApiResponse<CartView>, ApiError> {
    let cart = state.commerce.carts.clear_cart(&actor).await?;
    Ok(ApiResponse::ok(cart).with_message("Cart cleared"))
}
