//! Public catalog endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use common::{Money, ProductId};
use domain::{Category, Product};
use serde::Deserialize;
use store::{ProductQuery, Store};

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{QueryParams, parse_id};
use crate::response::ApiResponse;

/// Query string of `GET /products`. Prices are in minor units.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    pub keyword: Option<String>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub featured: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListParams {
    fn into_query(self) -> Result<ProductQuery, ApiError> {
        let mut query = ProductQuery::new();
        if let Some(category) = self.category.filter(|c| !c.is_empty()) {
            query = query.category(category.parse::<Category>()?);
        }
        if let Some(keyword) = self.keyword.filter(|k| !k.trim().is_empty()) {
            query = query.keyword(keyword);
        }
        if let Some(cents) = self.min_price_cents {
            query = query.min_price(Money::from_cents(cents));
        }
        if let Some(cents) = self.max_price_cents {
            query = query.max_price(Money::from_cents(cents));
        }
        if let Some(featured) = self.featured {
            query = query.featured(featured);
        }
        if let Some(page) = self.page {
            query = query.page(page);
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        Ok(query)
    }
}

/// GET /products
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    QueryParams(params): QueryParams<ListParams>,
) -> Result<ApiResponse<Vec<Product>>, ApiError> {
    let query = params.into_query()?;
    let (page, limit) = (query.page, query.limit);
    let result = state.commerce.catalog.list_products(query).await?;
    Ok(ApiResponse::page(result, page, limit))
}

/// GET /products/featured
#[tracing::instrument(skip(state))]
pub async fn featured<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<ApiResponse<Vec<Product>>, ApiError> {
    let products = state.commerce.catalog.featured_products().await?;
    Ok(ApiResponse::list(products))
}

/// GET /products/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Product>, ApiError> {
    let id: ProductId = parse_id(&id, "product")?;
    let product = state.commerce.catalog.get_product(id).await?;
    Ok(ApiResponse::ok(product))
}
