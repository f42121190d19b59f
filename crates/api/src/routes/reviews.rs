//! Product reviews.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{ProductId, ReviewId};
use domain::Review;
use serde::Deserialize;
use store::Store;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{Identity, JsonBody, parse_id};
use crate::response::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub rating: i64,
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReviewRequest {
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

/// GET /reviews/product/{product_id}
#[tracing::instrument(skip(state))]
pub async fn list_for_product<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(product_id): Path<String>,
) -> Result<ApiResponse<Vec<Review>>, ApiError> {
    let product_id: ProductId = parse_id(&product_id, "product")?;
    let reviews = state
        .commerce
        .reviews
        .list_product_reviews(product_id)
        .await?;
    Ok(ApiResponse::list(reviews))
}

/// POST /reviews/product/{product_id}
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Path(product_id): Path<String>,
    JsonBody(req): JsonBody<CreateReviewRequest>,
) -> Result<(StatusCode, ApiResponse<Review>), ApiError> {
    let product_id: ProductId = parse_id(&product_id, "product")?;
    let review = state
        .commerce
        .reviews
        .create_review(&actor, product_id, req.rating, &req.comment)
        .await?;
    Ok(ApiResponse::ok(review).with_message("Review added").created())
}

/// PUT /reviews/{id}
#[tracing::instrument(skip(state, req))]
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateReviewRequest>,
) -> Result<ApiResponse<Review>, ApiError> {
    let id: ReviewId = parse_id(&id, "review")?;
    let review = state
        .commerce
        .reviews
        .update_review(&actor, id, req.rating, req.comment.as_deref())
        .await?;
    Ok(ApiResponse::ok(review))
}

/// DELETE /reviews/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>, ApiError> {
    let id: ReviewId = parse_id(&id, "review")?;
    state.commerce.reviews.delete_review(&actor, id).await?;
    Ok(ApiResponse::message("Review deleted"))
}
