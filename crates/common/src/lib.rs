//! Shared identifiers and value types used across the storefront crates.

pub mod ids;
pub mod money;

pub use ids::{OrderId, ProductId, ReviewId, UserId};
pub use money::Money;
