//! HTTP route handlers, one module per resource.

pub mod admin;
pub mod cart;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod users;
