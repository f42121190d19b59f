//! Persistence layer for the storefront.
//!
//! [`Store`] is the seam between the workflows and the document database.
//! Two implementations are provided: [`InMemoryStore`] for tests and local
//! runs, and [`PostgresStore`] for production.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use query::{ProductPage, ProductQuery};
pub use store::Store;
