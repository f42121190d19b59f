//! Product reviews and rating aggregation.

use chrono::{DateTime, Utc};
use common::{ProductId, ReviewId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, check_length};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;
pub const MAX_COMMENT_LEN: usize = 500;

/// One rating and comment left by a user for a product.
///
/// At most one review exists per (user, product) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub user_name: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    pub fn new(
        product_id: ProductId,
        user_id: UserId,
        user_name: impl Into<String>,
        rating: i64,
        comment: &str,
    ) -> Result<Self, DomainError> {
        let rating = validate_rating(rating)?;
        let comment = validate_comment(comment)?;
        let now = Utc::now();
        Ok(Self {
            id: ReviewId::new(),
            product_id,
            user_id,
            user_name: user_name.into(),
            rating,
            comment,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a partial edit; absent fields keep their current values.
    pub fn edit(&mut self, rating: Option<i64>, comment: Option<&str>) -> Result<(), DomainError> {
        let rating = rating.map(validate_rating).transpose()?;
        let comment = comment.map(validate_comment).transpose()?;
        if let Some(rating) = rating {
            self.rating = rating;
        }
        if let Some(comment) = comment {
            self.comment = comment;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

pub fn validate_rating(rating: i64) -> Result<u8, DomainError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(DomainError::invalid(
            "rating",
            format!("must be between {MIN_RATING} and {MAX_RATING}"),
        ));
    }
    Ok(rating as u8)
}

pub fn validate_comment(comment: &str) -> Result<String, DomainError> {
    check_length("comment", comment, 1, MAX_COMMENT_LEN)
}

/// Derived rating fields of a product.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingSummary {
    pub rating: f64,
    pub num_reviews: u32,
}

impl RatingSummary {
    /// Mean of the ratings rounded half-up to one decimal place; zero when empty.
    ///
    /// The mean is computed in integer tenths so the result is exact.
    pub fn from_ratings<I>(ratings: I) -> Self
    where
        I: IntoIterator<Item = u8>,
    {
        let (sum, count) = ratings
            .into_iter()
            .fold((0u64, 0u64), |(sum, count), r| (sum + u64::from(r), count + 1));

        if count == 0 {
            return Self::default();
        }

        let tenths = (20 * sum + count) / (2 * count);
        Self {
            rating: tenths as f64 / 10.0,
            num_reviews: count as u32,
        }
    }
}
