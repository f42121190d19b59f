//! Product reviews and rating aggregation.
//!
//! Every review mutation recomputes the product's rating before returning,
//! so callers never observe a stale rating.

use common::{ProductId, ReviewId};
use domain::{Actor, RatingSummary, Review};
use store::{Store, StoreError};

use crate::error::{CommerceError, Result};

/// Service for creating and editing reviews.
#[derive(Clone)]
pub struct ReviewService<S: Store> {
    store: S,
}

impl<S: Store> ReviewService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    async fn require_product(&self, product_id: ProductId) -> Result<()> {
        match self.store.get_product(product_id).await? {
            Some(_) => Ok(()),
            None => Err(CommerceError::not_found("Product", product_id)),
        }
    }

    async fn load(&self, id: ReviewId) -> Result<Review> {
        self.store
            .get_review(id)
            .await?
            .ok_or_else(|| CommerceError::not_found("Review", id))
    }

    /// Recomputes a product's rating from all of its reviews.
    pub async fn recompute_rating(&self, product_id: ProductId) -> Result<RatingSummary> {
        let summary = self.store.recompute_rating(product_id).await?;
        tracing::debug!(%product_id, rating = summary.rating, num_reviews = summary.num_reviews, "rating recomputed");
        Ok(summary)
    }

    /// Reviews of a product, newest first.
    pub async fn list_product_reviews(&self, product_id: ProductId) -> Result<Vec<Review>> {
        self.require_product(product_id).await?;
        Ok(self.store.list_reviews_for_product(product_id).await?)
    }

    /// Creates the actor's review of a product they bought.
    #[tracing::instrument(skip(self, comment), fields(user_id = %actor.user_id))]
    pub async fn create_review(
        &self,
        actor: &Actor,
        product_id: ProductId,
        rating: i64,
        comment: &str,
    ) -> Result<Review> {
        self.require_product(product_id).await?;

        let user = self
            .store
            .get_user(actor.user_id)
            .await?
            .ok_or_else(|| CommerceError::not_found("User", actor.user_id))?;
        let review = Review::new(product_id, actor.user_id, &user.name, rating, comment)?;

        if !self
            .store
            .has_paid_order_with_product(actor.user_id, product_id)
            .await?
        {
            return Err(CommerceError::Forbidden(
                "you can only review products you have purchased".to_string(),
            ));
        }

        self.store
            .insert_review(review.clone())
            .await
            .map_err(|e| match e {
                StoreError::Duplicate { .. } => CommerceError::DuplicateReview(product_id),
                other => other.into(),
            })?;

        self.recompute_rating(product_id).await?;
        metrics::counter!("reviews_created_total").increment(1);
        Ok(review)
    }

    /// Edits the actor's own review.
    #[tracing::instrument(skip(self, comment), fields(user_id = %actor.user_id))]
    pub async fn update_review(
        &self,
        actor: &Actor,
        id: ReviewId,
        rating: Option<i64>,
        comment: Option<&str>,
    ) -> Result<Review> {
        let mut review = self.load(id).await?;
        if !actor.owns(review.user_id) {
            return Err(CommerceError::Forbidden(
                "not authorized to update this review".to_string(),
            ));
        }

        review.edit(rating, comment)?;
        self.store.update_review(review.clone()).await?;
        self.recompute_rating(review.product_id).await?;
        Ok(review)
    }

    /// Deletes a review; allowed for its author or an administrator.
    #[tracing::instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn delete_review(&self, actor: &Actor, id: ReviewId) -> Result<()> {
        let review = self.load(id).await?;
        if !actor.can_access(review.user_id) {
            return Err(CommerceError::Forbidden(
                "not authorized to delete this review".to_string(),
            ));
        }

        if !self.store.delete_review(id).await? {
            return Err(CommerceError::not_found("Review", id));
        }
        self.recompute_rating(review.product_id).await?;
        metrics::counter!("reviews_deleted_total").increment(1);
        Ok(())
    }
}
