//! Catalog products.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, check_length};
use crate::review::RatingSummary;

/// Highest accepted unit price: 1,000,000.00.
///
/// Keeps `price × quantity` for any `u32` quantity far from `i64` overflow.
pub const MAX_PRICE: Money = Money::from_dollars(1_000_000);

/// Closed set of catalog categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Electronics,
    Clothing,
    Books,
    Home,
    Sports,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Electronics,
        Category::Clothing,
        Category::Books,
        Category::Home,
        Category::Sports,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Electronics => "Electronics",
            Category::Clothing => "Clothing",
            Category::Books => "Books",
            Category::Home => "Home",
            Category::Sports => "Sports",
            Category::Other => "Other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::invalid("category", format!("unknown category '{s}'")))
    }
}

/// Editable product fields, as supplied by an administrator.
///
/// `stock` is signed so negative input can be rejected as a validation
/// failure rather than a decoding failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    #[serde(rename = "price_cents")]
    pub price: Money,
    pub category: Category,
    pub stock: i64,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
}

/// Validated form of a [`ProductDraft`].
struct ValidDraft {
    name: String,
    description: String,
    price: Money,
    stock: u32,
}

impl ProductDraft {
    fn validate(&self) -> Result<ValidDraft, DomainError> {
        let name = check_length("name", &self.name, 3, 100)?;
        let description = check_length("description", &self.description, 10, 2000)?;
        if self.price.is_negative() {
            return Err(DomainError::invalid("price", "must not be negative"));
        }
        if self.price > MAX_PRICE {
            return Err(DomainError::invalid(
                "price",
                format!("must not exceed {MAX_PRICE}"),
            ));
        }
        let stock = u32::try_from(self.stock)
            .map_err(|_| DomainError::invalid("stock", "must be between 0 and 4294967295"))?;
        Ok(ValidDraft {
            name,
            description,
            price: self.price,
            stock,
        })
    }
}

/// A catalog product.
///
/// `rating` and `num_reviews` are derived from the product's reviews and are
/// only ever written through [`Product::apply_rating`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    #[serde(rename = "price_cents")]
    pub price: Money,
    pub category: Category,
    pub stock: u32,
    pub images: Vec<String>,
    pub rating: f64,
    pub num_reviews: u32,
    pub featured: bool,
    pub brand: Option<String>,
    pub sku: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Builds a new product from a validated draft.
    pub fn create(draft: ProductDraft) -> Result<Self, DomainError> {
        let valid = draft.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: ProductId::new(),
            name: valid.name,
            description: valid.description,
            price: valid.price,
            category: draft.category,
            stock: valid.stock,
            images: draft.images,
            rating: 0.0,
            num_reviews: 0,
            featured: draft.featured,
            brand: draft.brand,
            sku: draft.sku,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces the editable fields; derived rating fields are untouched.
    pub fn apply_draft(&mut self, draft: ProductDraft) -> Result<(), DomainError> {
        let valid = draft.validate()?;
        self.name = valid.name;
        self.description = valid.description;
        self.price = valid.price;
        self.category = draft.category;
        self.stock = valid.stock;
        self.images = draft.images;
        self.featured = draft.featured;
        self.brand = draft.brand;
        self.sku = draft.sku;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn apply_rating(&mut self, summary: RatingSummary) {
        self.rating = summary.rating;
        self.num_reviews = summary.num_reviews;
    }

    pub fn has_stock(&self, quantity: u32) -> bool {
        self.stock >= quantity
    }

    /// Case-insensitive keyword match against name and description.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}
