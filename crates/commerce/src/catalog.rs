//! Public catalog reads.

use common::ProductId;
use domain::Product;
use store::{ProductPage, ProductQuery, Store};
use store::query::MAX_LIMIT;

use crate::error::{CommerceError, Result};

/// Number of products returned by [`CatalogService::featured_products`].
pub const FEATURED_LIMIT: u32 = 8;

/// Service for browsing products.
#[derive(Clone)]
pub struct CatalogService<S: Store> {
    store: S,
}

impl<S: Store> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists one page of products matching `query`, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_products(&self, query: ProductQuery) -> Result<ProductPage> {
        if query.page < 1 {
            return Err(CommerceError::ValidationFailed(
                "page must be at least 1".to_string(),
            ));
        }
        if !(1..=MAX_LIMIT).contains(&query.limit) {
            return Err(CommerceError::ValidationFailed(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        if let (Some(min), Some(max)) = (query.min_price, query.max_price) {
            if min > max {
                return Err(CommerceError::ValidationFailed(
                    "min price exceeds max price".to_string(),
                ));
            }
        }
        if query.min_price.is_some_and(|p| p.is_negative()) {
            return Err(CommerceError::ValidationFailed(
                "min price must not be negative".to_string(),
            ));
        }

        Ok(self.store.query_products(&query).await?)
    }

    /// Up to [`FEATURED_LIMIT`] featured products, newest first.
    pub async fn featured_products(&self) -> Result<Vec<Product>> {
        let query = ProductQuery::new().featured(true).limit(FEATURED_LIMIT);
        Ok(self.store.query_products(&query).await?.products)
    }

    pub async fn get_product(&self, id: ProductId) -> Result<Product> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| CommerceError::not_found("Product", id))
    }
}
