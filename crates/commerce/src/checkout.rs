//! Checkout coordinator: converts a user's cart into a paid order.

use std::collections::HashMap;

use chrono::Utc;
use common::ProductId;
use domain::{
    Actor, Order, OrderLine, PaymentRecord, PaymentStatus, PriceBreakdown, Product,
    ShippingAddress,
};
use serde::{Deserialize, Serialize};
use store::Store;
use uuid::Uuid;

use crate::error::{CommerceError, Result};
use crate::payment::{PaymentGateway, PaymentRequest};

/// Step name: validate the cart against live stock and price it.
pub const STEP_PRICE_CART: &str = "price_cart";

/// Step name: capture payment for the order total.
pub const STEP_CAPTURE_PAYMENT: &str = "capture_payment";

/// Step name: persist the order, decrement stock and clear the cart.
pub const STEP_COMMIT_ORDER: &str = "commit_order";

/// Client input for a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: ShippingAddress,
    pub payment_method_id: String,
}

/// Orchestrates checkout.
///
/// Stock is validated and the cart priced, payment is captured, then the
/// order is committed in one atomic store operation. If the commit fails
/// after capture, the payment is refunded.
pub struct CheckoutCoordinator<S, P>
where
    S: Store,
    P: PaymentGateway,
{
    store: S,
    payment: P,
    currency: String,
}

impl<S, P> CheckoutCoordinator<S, P>
where
    S: Store,
    P: PaymentGateway,
{
    pub fn new(store: S, payment: P, currency: impl Into<String>) -> Self {
        Self {
            store,
            payment,
            currency: currency.into(),
        }
    }

    /// Places an order from the actor's cart.
    #[tracing::instrument(skip(self, request), fields(user_id = %actor.user_id))]
    pub async fn checkout(&self, actor: &Actor, request: CheckoutRequest) -> Result<Order> {
        metrics::counter!("checkout_attempts_total").increment(1);
        let started = std::time::Instant::now();

        let result = self.run(actor, request).await;

        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        match &result {
            Ok(order) => {
                metrics::counter!("checkout_completed_total").increment(1);
                tracing::info!(
                    order_id = %order.id,
                    total = %order.pricing.total_price,
                    "checkout completed"
                );
            }
            Err(e) => {
                metrics::counter!("checkout_failed_total", "reason" => e.kind()).increment(1);
                tracing::warn!(error = %e, "checkout failed");
            }
        }
        result
    }

    async fn run(&self, actor: &Actor, request: CheckoutRequest) -> Result<Order> {
        let shipping_address = request.shipping_address.validated()?;
        let payment_method_id = request.payment_method_id.trim();
        if payment_method_id.is_empty() {
            return Err(CommerceError::ValidationFailed(
                "payment_method_id is required".to_string(),
            ));
        }

        // 1. Price the cart against live stock
        tracing::info!(step = STEP_PRICE_CART, "checkout step started");
        let mut cart = match self.store.get_cart(actor.user_id).await? {
            Some(cart) if !cart.is_empty() => cart,
            _ => return Err(CommerceError::EmptyCart),
        };

        let ids: Vec<ProductId> = cart.items.iter().map(|i| i.product_id).collect();
        let products: HashMap<ProductId, Product> = self
            .store
            .get_products(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        // Entries for deleted products are pruned the same way a cart read does.
        if cart.items.len() != products.len() {
            cart.reprice(&products);
            tracing::debug!(remaining = cart.items.len(), "pruned deleted products from cart");
            self.store.save_cart(cart.clone()).await?;
            if cart.is_empty() {
                return Err(CommerceError::EmptyCart);
            }
        }

        let mut lines = Vec::with_capacity(cart.items.len());
        for item in &cart.items {
            let Some(product) = products.get(&item.product_id) else {
                continue;
            };
            if !product.has_stock(item.quantity) {
                return Err(CommerceError::InsufficientStock {
                    product_id: product.id,
                    requested: item.quantity,
                    available: product.stock,
                });
            }
            lines.push(OrderLine {
                product_id: product.id,
                name: product.name.clone(),
                quantity: item.quantity,
                unit_price: product.price,
            });
        }
        let pricing = PriceBreakdown::for_lines(&lines);

        // 2. Capture payment
        tracing::info!(step = STEP_CAPTURE_PAYMENT, total = %pricing.total_price, "checkout step started");
        let confirmation = self
            .payment
            .capture(&PaymentRequest {
                amount: pricing.total_price,
                currency: self.currency.clone(),
                payment_method_id: payment_method_id.to_string(),
                idempotency_key: Uuid::new_v4().to_string(),
                description: format!("Order for user {}", actor.user_id),
            })
            .await?;

        if confirmation.status != PaymentStatus::Succeeded {
            return Err(CommerceError::PaymentFailed(format!(
                "payment {} reported status {}",
                confirmation.id, confirmation.status
            )));
        }

        let order = Order::place(
            actor.user_id,
            lines,
            shipping_address,
            pricing,
            self.payment.name(),
            PaymentRecord {
                id: confirmation.id,
                status: confirmation.status,
                update_time: Utc::now(),
            },
        );

        // 3. Commit order, stock and cart together
        tracing::info!(step = STEP_COMMIT_ORDER, order_id = %order.id, "checkout step started");
        if let Err(e) = self.store.commit_checkout(&order).await {
            self.compensate(&order.payment.id).await;
            return Err(e.into());
        }

        Ok(order)
    }

    /// Refunds a captured payment whose order could not be committed.
    ///
    /// A failed refund is logged and counted; the caller still sees the
    /// original commit error.
    #[tracing::instrument(skip(self))]
    async fn compensate(&self, payment_id: &str) {
        match self.payment.refund(payment_id).await {
            Ok(()) => {
                metrics::counter!("checkout_compensations_total", "outcome" => "refunded")
                    .increment(1);
                tracing::warn!(%payment_id, "payment refunded after failed commit");
            }
            Err(e) => {
                metrics::counter!("checkout_compensations_total", "outcome" => "refund_failed")
                    .increment(1);
                tracing::error!(%payment_id, error = %e, "refund failed, manual reconciliation required");
            }
        }
    }
}
