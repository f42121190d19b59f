//! Cart mutations. Every operation returns the cart repriced from live catalog data.

use std::collections::HashMap;

use common::ProductId;
use domain::{Actor, Cart, CartView, Product};
use store::Store;

use crate::error::{CommerceError, Result};

/// Service for a user's shopping cart.
#[derive(Clone)]
pub struct CartService<S: Store> {
    store: S,
}

impl<S: Store> CartService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    async fn live_products(&self, cart: &Cart) -> Result<HashMap<ProductId, Product>> {
        let ids: Vec<ProductId> = cart.items.iter().map(|i| i.product_id).collect();
        let products = self.store.get_products(&ids).await?;
        Ok(products.into_iter().map(|p| (p.id, p)).collect())
    }

    async fn existing_cart(&self, actor: &Actor) -> Result<Cart> {
        self.store
            .get_cart(actor.user_id)
            .await?
            .ok_or_else(|| CommerceError::not_found("Cart", actor.user_id))
    }

    /// Reprices and persists `cart`.
    async fn reprice_and_save(&self, mut cart: Cart) -> Result<CartView> {
        let products = self.live_products(&cart).await?;
        let view = cart.reprice(&products);
        self.store.save_cart(cart).await?;
        Ok(view)
    }

    /// Returns the actor's cart, creating an empty one on first access.
    #[tracing::instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn get_cart(&self, actor: &Actor) -> Result<CartView> {
        let Some(mut cart) = self.store.get_cart(actor.user_id).await? else {
            return self.reprice_and_save(Cart::new(actor.user_id)).await;
        };

        let before = cart.clone();
        let products = self.live_products(&cart).await?;
        let view = cart.reprice(&products);
        if cart != before {
            self.store.save_cart(cart).await?;
        }
        Ok(view)
    }

    /// Adds `quantity` of a product, merging with an existing entry.
    ///
    /// The merged quantity must not exceed live stock.
    #[tracing::instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn add_item(
        &self,
        actor: &Actor,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartView> {
        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|q| *q >= 1)
            .ok_or_else(|| {
                CommerceError::ValidationFailed("quantity must be at least 1".to_string())
            })?;

        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or_else(|| CommerceError::not_found("Product", product_id))?;

        let mut cart = self
            .store
            .get_cart(actor.user_id)
            .await?
            .unwrap_or_else(|| Cart::new(actor.user_id));

        let merged = cart.quantity_of(product_id).saturating_add(quantity);
        if !product.has_stock(merged) {
            return Err(CommerceError::InsufficientStock {
                product_id,
                requested: merged,
                available: product.stock,
            });
        }

        cart.add(product_id, quantity)?;
        let view = self.reprice_and_save(cart).await?;
        metrics::counter!("cart_mutations_total", "op" => "add").increment(1);
        Ok(view)
    }

    /// Sets an entry's quantity; a quantity of zero or less removes it.
    #[tracing::instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn update_item(
        &self,
        actor: &Actor,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartView> {
        let mut cart = self.existing_cart(actor).await?;
        if !cart.set_quantity(product_id, quantity)? {
            return Err(CommerceError::not_found("CartItem", product_id));
        }

        let view = self.reprice_and_save(cart).await?;
        metrics::counter!("cart_mutations_total", "op" => "update").increment(1);
        Ok(view)
    }

    /// Removes a product from the cart. Removing an absent product is a no-op.
    #[tracing::instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn remove_item(&self, actor: &Actor, product_id: ProductId) -> Result<CartView> {
        let mut cart = self.existing_cart(actor).await?;
        cart.remove(product_id);

        let view = self.reprice_and_save(cart).await?;
        metrics::counter!("cart_mutations_total", "op" => "remove").increment(1);
        Ok(view)
    }

    #[tracing::instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn clear_cart(&self, actor: &Actor) -> Result<CartView> {
        let mut cart = self.existing_cart(actor).await?;
        cart.clear();

        let view = self.reprice_and_save(cart).await?;
        metrics::counter!("cart_mutations_total", "op" => "clear").increment(1);
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use common::{Money, UserId};
    use domain::{Category, ProductDraft};
    use store::InMemoryStore;

    use super::*;

    async fn setup(price_cents: i64, stock: i64) -> (CartService<InMemoryStore>, InMemoryStore, Product) {
        let store = InMemoryStore::new();
        let product = Product::create(ProductDraft {
            name: "Coffee Maker".to_string(),
            description: "Programmable coffee maker".to_string(),
            price: Money::from_cents(price_cents),
            category: Category::Home,
            stock,
            images: vec![],
            featured: false,
            brand: None,
            sku: None,
        })
        .unwrap();
        store.insert_product(product.clone()).await.unwrap();
        (CartService::new(store.clone()), store, product)
    }

    #[tokio::test]
    async fn test_get_creates_empty_cart() {
        let (carts, store, _) = setup(7999, 40).await;
        let actor = Actor::user(UserId::new());

        let view = carts.get_cart(&actor).await.unwrap();
        assert!(view.items.is_empty());
        assert_eq!(view.total, Money::zero());
        assert!(store.get_cart(actor.user_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_add_merges_and_totals() {
        let (carts, _, product) = setup(7999, 40).await;
        let actor = Actor::user(UserId::new());

        carts.add_item(&actor, product.id, 1).await.unwrap();
        let view = carts.add_item(&actor, product.id, 2).await.unwrap();

        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].quantity, 3);
        assert_eq!(view.total, Money::from_cents(3 * 7999));
    }

    #[tokio::test]
    async fn test_add_checks_merged_quantity_against_stock() {
        let (carts, _, product) = setup(7999, 3).await;
        let actor = Actor::user(UserId::new());

        carts.add_item(&actor, product.id, 2).await.unwrap();
        let result = carts.add_item(&actor, product.id, 2).await;
        assert!(matches!(
            result,
            Err(CommerceError::InsufficientStock { requested: 4, available: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_add_rejects_bad_quantity_and_unknown_product() {
        let (carts, _, product) = setup(7999, 3).await;
        let actor = Actor::user(UserId::new());

        assert!(matches!(
            carts.add_item(&actor, product.id, 0).await,
            Err(CommerceError::ValidationFailed(_))
        ));
        assert!(matches!(
            carts.add_item(&actor, ProductId::new(), 1).await,
            Err(CommerceError::NotFound { entity: "Product", .. })
        ));
    }

    #[tokio::test]
    async fn test_update_to_zero_removes_entry() {
        let (carts, _, product) = setup(7999, 10).await;
        let actor = Actor::user(UserId::new());
        carts.add_item(&actor, product.id, 2).await.unwrap();

        let view = carts.update_item(&actor, product.id, 0).await.unwrap();
        assert!(view.items.is_empty());
        assert_eq!(view.total, Money::zero());

        let missing = carts.update_item(&actor, product.id, 1).await;
        assert!(matches!(
            missing,
            Err(CommerceError::NotFound { entity: "CartItem", .. })
        ));
    }

    #[tokio::test]
    async fn test_mutations_require_existing_cart() {
        let (carts, _, product) = setup(7999, 10).await;
        let actor = Actor::user(UserId::new());

        assert!(matches!(
            carts.remove_item(&actor, product.id).await,
            Err(CommerceError::NotFound { entity: "Cart", .. })
        ));
        assert!(matches!(
            carts.clear_cart(&actor).await,
            Err(CommerceError::NotFound { entity: "Cart", .. })
        ));
    }

    #[tokio::test]
    async fn test_deleted_product_pruned_on_read() {
        let (carts, store, product) = setup(7999, 10).await;
        let actor = Actor::user(UserId::new());
        carts.add_item(&actor, product.id, 2).await.unwrap();

        store.delete_product(product.id).await.unwrap();

        let view = carts.get_cart(&actor).await.unwrap();
        assert!(view.items.is_empty());
        let stored = store.get_cart(actor.user_id).await.unwrap().unwrap();
        assert!(stored.is_empty());
        assert_eq!(stored.total, Money::zero());
    }

    #[tokio::test]
    async fn test_total_follows_live_price() {
        let (carts, store, mut product) = setup(1000, 10).await;
        let actor = Actor::user(UserId::new());
        carts.add_item(&actor, product.id, 2).await.unwrap();

        product.price = Money::from_cents(1500);
        store.update_product(product).await.unwrap();

        let view = carts.get_cart(&actor).await.unwrap();
        assert_eq!(view.total, Money::from_cents(3000));
    }

    #[tokio::test]
    async fn test_oversized_price_does_not_overflow_total() {
        let (carts, store, mut product) = setup(1000, 10).await;
        // Written straight to the store, bypassing draft validation.
        product.price = Money::from_cents(5_000_000_000_000_000_000);
        store.update_product(product.clone()).await.unwrap();

        let actor = Actor::user(UserId::new());
        let view = carts.add_item(&actor, product.id, 2).await.unwrap();
        assert_eq!(view.total, Money::from_cents(i64::MAX));
    }
}
