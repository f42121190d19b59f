//! Customer-facing order reads and cancellation.

use common::OrderId;
use domain::{Actor, Order, OrderStatus};
use store::Store;

use crate::error::{CommerceError, Result};

/// Service for a user's own orders.
#[derive(Clone)]
pub struct OrderService<S: Store> {
    store: S,
}

impl<S: Store> OrderService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    async fn load(&self, id: OrderId) -> Result<Order> {
        self.store
            .get_order(id)
            .await?
            .ok_or_else(|| CommerceError::not_found("Order", id))
    }

    /// Orders placed by the actor, newest first.
    pub async fn list_my_orders(&self, actor: &Actor) -> Result<Vec<Order>> {
        Ok(self.store.list_orders_for_user(actor.user_id).await?)
    }

    /// Fetches an order visible to its owner or an administrator.
    #[tracing::instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn get_order(&self, actor: &Actor, id: OrderId) -> Result<Order> {
        let order = self.load(id).await?;
        if !actor.can_access(order.user_id) {
            return Err(CommerceError::Forbidden(
                "not authorized to view this order".to_string(),
            ));
        }
        Ok(order)
    }

    /// Cancels a `Processing` order owned by the actor and restores its stock.
    #[tracing::instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn cancel_order(&self, actor: &Actor, id: OrderId) -> Result<Order> {
        let mut order = self.load(id).await?;
        if !actor.owns(order.user_id) {
            return Err(CommerceError::Forbidden(
                "only the owner may cancel an order".to_string(),
            ));
        }

        let expected = order.status;
        order.transition(OrderStatus::Cancelled)?;
        self.store
            .commit_cancellation(&order, expected)
            .await
            .map_err(|e| CommerceError::from_status_conflict(e, OrderStatus::Cancelled))?;

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(order_id = %order.id, "order cancelled");
        Ok(order)
    }
}
