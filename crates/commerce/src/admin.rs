//! Administrative operations. Every method requires the admin role.

use common::{Money, OrderId, ProductId};
use domain::{Actor, Order, OrderStatus, Product, ProductDraft, User};
use serde::{Deserialize, Serialize};
use store::Store;

use crate::error::{CommerceError, Result};

/// Order counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub processing: u64,
    pub shipped: u64,
    pub delivered: u64,
    pub cancelled: u64,
}

impl StatusCounts {
    fn record(&mut self, status: OrderStatus) {
        match status {
            OrderStatus::Processing => self.processing += 1,
            OrderStatus::Shipped => self.shipped += 1,
            OrderStatus::Delivered => self.delivered += 1,
            OrderStatus::Cancelled => self.cancelled += 1,
        }
    }
}

/// Store-wide summary for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    pub total_users: u64,
    pub total_products: u64,
    pub total_orders: u64,
    /// Sum of `total_price` over orders that were not cancelled.
    #[serde(rename = "revenue_cents")]
    pub revenue: Money,
    pub orders_by_status: StatusCounts,
}

impl Dashboard {
    fn from_orders(total_users: u64, total_products: u64, orders: &[Order]) -> Self {
        let mut orders_by_status = StatusCounts::default();
        let mut revenue = Money::zero();
        for order in orders {
            orders_by_status.record(order.status);
            if order.status != OrderStatus::Cancelled {
                revenue += order.pricing.total_price;
            }
        }
        Self {
            total_users,
            total_products,
            total_orders: orders.len() as u64,
            revenue,
            orders_by_status,
        }
    }
}

#[derive(Clone)]
pub struct AdminService<S: Store> {
    store: S,
}

impl<S: Store> AdminService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, draft), fields(user_id = %actor.user_id))]
    pub async fn create_product(&self, actor: &Actor, draft: ProductDraft) -> Result<Product> {
        actor.require_admin()?;
        let product = Product::create(draft)?;
        self.store.insert_product(product.clone()).await?;
        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    /// Replaces every editable field of a product.
    #[tracing::instrument(skip(self, draft), fields(user_id = %actor.user_id))]
    pub async fn update_product(
        &self,
        actor: &Actor,
        id: ProductId,
        draft: ProductDraft,
    ) -> Result<Product> {
        actor.require_admin()?;
        let mut product = self
            .store
            .get_product(id)
            .await?
            .ok_or_else(|| CommerceError::not_found("Product", id))?;
        product.apply_draft(draft)?;
        self.store.update_product(product.clone()).await?;
        Ok(product)
    }

    /// Deletes a product together with its reviews.
    #[tracing::instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn delete_product(&self, actor: &Actor, id: ProductId) -> Result<()> {
        actor.require_admin()?;
        if !self.store.delete_product(id).await? {
            return Err(CommerceError::not_found("Product", id));
        }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    /// All orders, newest first.
    pub async fn list_orders(&self, actor: &Actor) -> Result<Vec<Order>> {
        actor.require_admin()?;
        Ok(self.store.list_orders().await?)
    }

    /// Advances an order along `Processing → Shipped → Delivered`.
    ///
    /// Cancellation belongs to the owner and is refused here.
    #[tracing::instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn update_order_status(
        &self,
        actor: &Actor,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order> {
        actor.require_admin()?;
        let mut order = self
            .store
            .get_order(id)
            .await?
            .ok_or_else(|| CommerceError::not_found("Order", id))?;

        if status == OrderStatus::Cancelled {
            return Err(CommerceError::InvalidTransition {
                from: order.status,
                to: status,
            });
        }

        let expected = order.status;
        order.transition(status)?;
        self.store
            .update_order_status(&order, expected)
            .await
            .map_err(|e| CommerceError::from_status_conflict(e, status))?;

        metrics::counter!("order_status_updates_total", "status" => status.as_str()).increment(1);
        tracing::info!(order_id = %order.id, %status, "order status updated");
        Ok(order)
    }

    pub async fn list_users(&self, actor: &Actor) -> Result<Vec<User>> {
        actor.require_admin()?;
        Ok(self.store.list_users().await?)
    }

    pub async fn dashboard(&self, actor: &Actor) -> Result<Dashboard> {
        actor.require_admin()?;
        let users = self.store.list_users().await?;
        let products = self.store.count_products().await?;
        let orders = self.store.list_orders().await?;
        Ok(Dashboard::from_orders(users.len() as u64, products, &orders))
    }
}

#[cfg(test)]
mod tests {
    use common::UserId;
    use domain::Category;
    use store::InMemoryStore;

    use super::*;

    fn draft() -> ProductDraft {
        ProductDraft {
            name: "Smart Watch".to_string(),
            description: "Fitness tracking smartwatch".to_string(),
            price: Money::from_cents(29999),
            category: Category::Electronics,
            stock: 30,
            images: vec![],
            featured: true,
            brand: Some("TechWear".to_string()),
            sku: None,
        }
    }

    #[tokio::test]
    async fn test_requires_admin() {
        let admin = AdminService::new(InMemoryStore::new());
        let user = Actor::user(UserId::new());

        assert!(matches!(
            admin.create_product(&user, draft()).await,
            Err(CommerceError::Forbidden(_))
        ));
        assert!(matches!(
            admin.dashboard(&user).await,
            Err(CommerceError::Forbidden(_))
        ));
        assert!(matches!(
            admin.list_users(&user).await,
            Err(CommerceError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_product_crud() {
        let store = InMemoryStore::new();
        let admin = AdminService::new(store.clone());
        let actor = Actor::admin(UserId::new());

        let product = admin.create_product(&actor, draft()).await.unwrap();

        let mut changed = draft();
        changed.price = Money::from_cents(24999);
        changed.stock = 12;
        let updated = admin
            .update_product(&actor, product.id, changed)
            .await
            .unwrap();
        assert_eq!(updated.price, Money::from_cents(24999));
        assert_eq!(updated.stock, 12);
        assert_eq!(updated.created_at, product.created_at);

        admin.delete_product(&actor, product.id).await.unwrap();
        assert!(store.get_product(product.id).await.unwrap().is_none());
        assert!(matches!(
            admin.delete_product(&actor, product.id).await,
            Err(CommerceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_draft_rejected() {
        let admin = AdminService::new(InMemoryStore::new());
        let mut bad = draft();
        bad.stock = -1;
        assert!(matches!(
            admin.create_product(&Actor::admin(UserId::new()), bad).await,
            Err(CommerceError::ValidationFailed(_))
        ));
    }
}
