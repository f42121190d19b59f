//! Workflow error types.

use common::ProductId;
use domain::{DomainError, OrderStatus};
use store::StoreError;
use thiserror::Error;

use crate::payment::PaymentError;

/// Errors returned by the storefront services.
///
/// Every variant except `Store` is a client-facing outcome; `Store` wraps
/// infrastructure failures.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// The addressed entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The actor lacks rights over the entity.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Malformed input.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Checkout was attempted on a missing or empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Requested quantity exceeds live stock.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// The payment gateway did not confirm the capture.
    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    /// The user already reviewed this product.
    #[error("Product {0} already reviewed by this user")]
    DuplicateReview(ProductId),

    /// A unique record (e.g. a registered email) already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// The order state machine rejects the move.
    #[error("Invalid status transition: cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// No authenticated identity accompanied the call.
    #[error("Authentication required")]
    Unauthorized,

    /// Persistence failure.
    #[error(transparent)]
    Store(StoreError),
}

impl CommerceError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CommerceError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Stable snake_case label, used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CommerceError::NotFound { .. } => "not_found",
            CommerceError::Forbidden(_) => "forbidden",
            CommerceError::ValidationFailed(_) => "validation_failed",
            CommerceError::EmptyCart => "empty_cart",
            CommerceError::InsufficientStock { .. } => "insufficient_stock",
            CommerceError::PaymentFailed(_) => "payment_failed",
            CommerceError::DuplicateReview(_) => "duplicate_review",
            CommerceError::AlreadyExists(_) => "already_exists",
            CommerceError::InvalidTransition { .. } => "invalid_transition",
            CommerceError::Unauthorized => "unauthorized",
            CommerceError::Store(_) => "store",
        }
    }

    /// Maps a failed status compare-and-set to the transition the caller attempted.
    pub(crate) fn from_status_conflict(err: StoreError, to: OrderStatus) -> Self {
        match err {
            StoreError::StatusConflict { actual, .. } => {
                CommerceError::InvalidTransition { from: actual, to }
            }
            other => other.into(),
        }
    }
}

impl From<DomainError> for CommerceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation { .. } => CommerceError::ValidationFailed(err.to_string()),
            DomainError::InvalidTransition { from, to } => {
                CommerceError::InvalidTransition { from, to }
            }
            DomainError::Forbidden(reason) => CommerceError::Forbidden(reason),
        }
    }
}

impl From<StoreError> for CommerceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => CommerceError::NotFound { entity, id },
            StoreError::Duplicate { detail, .. } => CommerceError::AlreadyExists(detail),
            StoreError::InsufficientStock {
                product_id,
                requested,
                available,
            } => CommerceError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            other => CommerceError::Store(other),
        }
    }
}

impl From<PaymentError> for CommerceError {
    fn from(err: PaymentError) -> Self {
        CommerceError::PaymentFailed(err.to_string())
    }
}

/// Convenience type alias for service results.
pub type Result<T> = std::result::Result<T, CommerceError>;
