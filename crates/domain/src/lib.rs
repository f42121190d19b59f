//! Domain layer for the storefront backend.
//!
//! Everything in this crate is pure, with no I/O. It provides:
//! - catalog products and categories
//! - carts and the live-price cart view
//! - orders with the `Processing → Shipped → Delivered` / `Cancelled` state machine
//! - checkout pricing (tax, shipping) in integer minor units
//! - reviews and rating aggregation
//! - users, roles and the acting identity used for capability checks

pub mod actor;
pub mod cart;
pub mod error;
pub mod order;
pub mod pricing;
pub mod product;
pub mod review;
pub mod user;

pub use actor::{Actor, Role};
pub use cart::{Cart, CartItem, CartLine, CartView};
pub use error::DomainError;
pub use order::{Order, OrderLine, OrderStatus, PaymentRecord, PaymentStatus, ShippingAddress};
pub use pricing::PriceBreakdown;
pub use product::{Category, MAX_PRICE, Product, ProductDraft};
pub use review::{RatingSummary, Review};
pub use user::{ProfileUpdate, User};

pub use common::{Money, OrderId, ProductId, ReviewId, UserId};
