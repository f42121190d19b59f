//! Storefront workflows.
//!
//! Each service wraps a [`store::Store`] and takes the acting identity
//! explicitly, so capability checks are visible at every call site:
//!
//! - [`CatalogService`]: product browsing
//! - [`CartService`]: cart mutations repriced from the live catalog
//! - [`CheckoutCoordinator`]: cart → payment capture → atomic order commit,
//!   refunding the payment if the commit fails
//! - [`OrderService`]: order reads and owner cancellation
//! - [`ReviewService`]: reviews with synchronous rating recomputation
//! - [`UserService`] and [`AdminService`]

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod orders;
pub mod payment;
pub mod reviews;
pub mod seed;
pub mod stripe;
pub mod users;

use std::sync::Arc;

use store::Store;

pub use admin::{AdminService, Dashboard, StatusCounts};
pub use cart::CartService;
pub use catalog::{CatalogService, FEATURED_LIMIT};
pub use checkout::{CheckoutCoordinator, CheckoutRequest};
pub use error::{CommerceError, Result};
pub use orders::OrderService;
pub use payment::{
    InMemoryPaymentGateway, PaymentConfirmation, PaymentError, PaymentGateway, PaymentRequest,
};
pub use reviews::ReviewService;
pub use seed::{SeedSummary, seed_demo_data};
pub use stripe::StripeGateway;
pub use users::UserService;

/// Every service wired to one store and payment gateway.
pub struct Commerce<S: Store + Clone> {
    pub catalog: CatalogService<S>,
    pub carts: CartService<S>,
    pub checkout: CheckoutCoordinator<S, Arc<dyn PaymentGateway>>,
    pub orders: OrderService<S>,
    pub reviews: ReviewService<S>,
    pub users: UserService<S>,
    pub admin: AdminService<S>,
}

impl<S: Store + Clone> Commerce<S> {
    pub fn new(store: S, payment: Arc<dyn PaymentGateway>, currency: impl Into<String>) -> Self {
        Self {
            catalog: CatalogService::new(store.clone()),
            carts: CartService::new(store.clone()),
            checkout: CheckoutCoordinator::new(store.clone(), payment, currency),
            orders: OrderService::new(store.clone()),
            reviews: ReviewService::new(store.clone()),
            users: UserService::new(store.clone()),
            admin: AdminService::new(store),
        }
    }
}
