use common::Money;
use domain::{Category, Product};

/// Page size used when none is given.
pub const DEFAULT_LIMIT: u32 = 10;

/// Largest accepted page size.
pub const MAX_LIMIT: u32 = 100;

/// Builder for catalog listing queries.
///
/// All filters are conjunctive. Results are ordered newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductQuery {
    /// Filter by category.
    pub category: Option<Category>,

    /// Case-insensitive match against name or description.
    pub keyword: Option<String>,

    /// Minimum price (inclusive).
    pub min_price: Option<Money>,

    /// Maximum price (inclusive).
    pub max_price: Option<Money>,

    /// Filter on the featured flag.
    pub featured: Option<bool>,

    /// 1-based page number.
    pub page: u32,

    /// Page size.
    pub limit: u32,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            category: None,
            keyword: None,
            min_price: None,
            max_price: None,
            featured: None,
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ProductQuery {
    /// Creates a query matching every product, first page.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn min_price(mut self, price: Money) -> Self {
        self.min_price = Some(price);
        self
    }

    pub fn max_price(mut self, price: Money) -> Self {
        self.max_price = Some(price);
        self
    }

    pub fn featured(mut self, featured: bool) -> Self {
        self.featured = Some(featured);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Number of matching products skipped before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Returns true if `product` passes every filter.
    pub fn matches(&self, product: &Product) -> bool {
        self.category.is_none_or(|c| product.category == c)
            && self
                .keyword
                .as_deref()
                .is_none_or(|k| product.matches_keyword(k))
            && self.min_price.is_none_or(|min| product.price >= min)
            && self.max_price.is_none_or(|max| product.price <= max)
            && self.featured.is_none_or(|f| product.featured == f)
    }
}

/// One page of catalog results.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPage {
    pub products: Vec<Product>,
    /// Number of products matching the filters across all pages.
    pub total: u64,
}
