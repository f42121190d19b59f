use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, ProductId, ReviewId, UserId};
use domain::{Cart, Order, OrderStatus, Product, RatingSummary, Review, User};
use tokio::sync::RwLock;

use crate::{ProductPage, ProductQuery, Result, Store, StoreError};

#[derive(Debug, Default)]
struct Collections {
    users: HashMap<UserId, User>,
    products: HashMap<ProductId, Product>,
    carts: HashMap<UserId, Cart>,
    orders: HashMap<OrderId, Order>,
    reviews: HashMap<ReviewId, Review>,
}

impl Collections {
    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn current_status(&self, order_id: OrderId) -> Result<OrderStatus> {
        self.orders
            .get(&order_id)
            .map(|o| o.status)
            .ok_or_else(|| StoreError::not_found("Order", order_id))
    }

    fn check_status(&self, order_id: OrderId, expected: OrderStatus) -> Result<()> {
        let actual = self.current_status(order_id)?;
        if actual != expected {
            return Err(StoreError::StatusConflict {
                order_id,
                expected,
                actual,
            });
        }
        Ok(())
    }
}

/// In-memory store implementation for testing and local runs.
///
/// All collections sit behind a single lock, so every `commit_*` method
/// observes and mutates a consistent snapshot.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<Collections>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears every collection.
    pub async fn clear(&self) {
        *self.state.write().await = Collections::default();
    }
}

fn newest_first<T, F>(mut items: Vec<T>, created: F) -> Vec<T>
where
    F: Fn(&T) -> chrono::DateTime<chrono::Utc>,
{
    items.sort_by(|a, b| created(b).cmp(&created(a)));
    items
}

#[async_trait]
impl Store for InMemoryStore {
    async fn insert_user(&self, user: User) -> Result<()> {
        let mut state = self.state.write().await;
        if state.email_taken(&user.email, None) {
            return Err(StoreError::Duplicate {
                entity: "User",
                detail: format!("email {} already registered", user.email),
            });
        }
        state.users.insert(user.id, user);
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, user: User) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user.id) {
            return Err(StoreError::not_found("User", user.id));
        }
        if state.email_taken(&user.email, Some(user.id)) {
            return Err(StoreError::Duplicate {
                entity: "User",
                detail: format!("email {} already registered", user.email),
            });
        }
        state.users.insert(user.id, user);
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let users = self.state.read().await.users.values().cloned().collect();
        Ok(newest_first(users, |u: &User| u.created_at))
    }

    async fn insert_product(&self, product: Product) -> Result<()> {
        let mut state = self.state.write().await;
        if state.products.contains_key(&product.id) {
            return Err(StoreError::Duplicate {
                entity: "Product",
                detail: product.id.to_string(),
            });
        }
        state.products.insert(product.id, product);
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.products.get(id).cloned())
            .collect())
    }

    async fn query_products(&self, query: &ProductQuery) -> Result<ProductPage> {
        let state = self.state.read().await;
        let matching: Vec<Product> = state
            .products
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        let total = matching.len() as u64;

        let products = newest_first(matching, |p: &Product| p.created_at)
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .collect();

        Ok(ProductPage { products, total })
    }

    async fn update_product(&self, product: Product) -> Result<()> {
        let mut state = self.state.write().await;
        match state.products.get_mut(&product.id) {
            Some(existing) => {
                *existing = product;
                Ok(())
            }
            None => Err(StoreError::not_found("Product", product.id)),
        }
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let mut state = self.state.write().await;
        let removed = state.products.remove(&id).is_some();
        if removed {
            state.reviews.retain(|_, r| r.product_id != id);
        }
        Ok(removed)
    }

    async fn recompute_rating(&self, id: ProductId) -> Result<RatingSummary> {
        let mut state = self.state.write().await;
        let summary = RatingSummary::from_ratings(
            state
                .reviews
                .values()
                .filter(|r| r.product_id == id)
                .map(|r| r.rating),
        );
        let product = state
            .products
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Product", id))?;
        product.apply_rating(summary);
        Ok(summary)
    }

    async fn count_products(&self) -> Result<u64> {
        Ok(self.state.read().await.products.len() as u64)
    }

    async fn get_cart(&self, user_id: UserId) -> Result<Option<Cart>> {
        Ok(self.state.read().await.carts.get(&user_id).cloned())
    }

    async fn save_cart(&self, cart: Cart) -> Result<()> {
        self.state.write().await.carts.insert(cart.user_id, cart);
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let orders = self
            .state
            .read()
            .await
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(orders, |o: &Order| o.created_at))
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let orders = self.state.read().await.orders.values().cloned().collect();
        Ok(newest_first(orders, |o: &Order| o.created_at))
    }

    async fn has_paid_order_with_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .values()
            .any(|o| o.user_id == user_id && o.is_paid && o.contains_product(product_id)))
    }

    async fn commit_checkout(&self, order: &Order) -> Result<()> {
        let mut state = self.state.write().await;

        let mut wanted: HashMap<ProductId, u32> = HashMap::new();
        for line in &order.items {
            *wanted.entry(line.product_id).or_default() += line.quantity;
        }

        // Validate every decrement before touching anything
        for (&product_id, &requested) in &wanted {
            let product = state
                .products
                .get(&product_id)
                .ok_or_else(|| StoreError::not_found("Product", product_id))?;
            if product.stock < requested {
                return Err(StoreError::InsufficientStock {
                    product_id,
                    requested,
                    available: product.stock,
                });
            }
        }

        for (product_id, requested) in wanted {
            if let Some(product) = state.products.get_mut(&product_id) {
                product.stock -= requested;
            }
        }

        state.orders.insert(order.id, order.clone());

        if let Some(cart) = state.carts.get_mut(&order.user_id) {
            cart.clear();
        }

        Ok(())
    }

    async fn update_order_status(&self, order: &Order, expected: OrderStatus) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_status(order.id, expected)?;
        state.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn commit_cancellation(&self, order: &Order, expected: OrderStatus) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_status(order.id, expected)?;

        for line in &order.items {
            if let Some(product) = state.products.get_mut(&line.product_id) {
                product.stock = product.stock.saturating_add(line.quantity);
            }
        }
        state.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn insert_review(&self, review: Review) -> Result<()> {
        let mut state = self.state.write().await;
        let duplicate = state
            .reviews
            .values()
            .any(|r| r.product_id == review.product_id && r.user_id == review.user_id);
        if duplicate {
            return Err(StoreError::Duplicate {
                entity: "Review",
                detail: format!(
                    "user {} already reviewed product {}",
                    review.user_id, review.product_id
                ),
            });
        }
        state.reviews.insert(review.id, review);
        Ok(())
    }

    async fn get_review(&self, id: ReviewId) -> Result<Option<Review>> {
        Ok(self.state.read().await.reviews.get(&id).cloned())
    }

    async fn list_reviews_for_product(&self, product_id: ProductId) -> Result<Vec<Review>> {
        let reviews = self
            .state
            .read()
            .await
            .reviews
            .values()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect();
        Ok(newest_first(reviews, |r: &Review| r.created_at))
    }

    async fn update_review(&self, review: Review) -> Result<()> {
        let mut state = self.state.write().await;
        match state.reviews.get_mut(&review.id) {
            Some(existing) => {
                *existing = review;
                Ok(())
            }
            None => Err(StoreError::not_found("Review", review.id)),
        }
    }

    async fn delete_review(&self, id: ReviewId) -> Result<bool> {
        Ok(self.state.write().await.reviews.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use common::Money;
    use domain::{
        Category, OrderLine, PaymentRecord, PaymentStatus, PriceBreakdown, ProductDraft, Role,
        ShippingAddress,
    };

    use super::*;

    fn product(stock: i64) -> Product {
        Product::create(ProductDraft {
            name: "Running Shoes".to_string(),
            description: "Comfortable running shoes".to_string(),
            price: Money::from_cents(8999),
            category: Category::Sports,
            stock,
            images: vec![],
            featured: false,
            brand: None,
            sku: None,
        })
        .unwrap()
    }

    fn order_for(user_id: UserId, lines: Vec<(ProductId, u32)>) -> Order {
        let items: Vec<OrderLine> = lines
            .into_iter()
            .map(|(product_id, quantity)| OrderLine {
                product_id,
                name: "Running Shoes".to_string(),
                quantity,
                unit_price: Money::from_cents(8999),
            })
            .collect();
        let pricing = PriceBreakdown::for_lines(&items);
        Order::place(
            user_id,
            items,
            ShippingAddress {
                street: "1 Main St".to_string(),
                city: "Springfield".to_string(),
                state: None,
                postal_code: "12345".to_string(),
                country: "US".to_string(),
            },
            pricing,
            "memory",
            PaymentRecord {
                id: "PAY-0001".to_string(),
                status: PaymentStatus::Succeeded,
                update_time: Utc::now(),
            },
        )
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = InMemoryStore::new();
        let user = User::register("John Doe", "john@example.com", Role::User).unwrap();
        store.insert_user(user).await.unwrap();

        let again = User::register("Johnny", "john@example.com", Role::User).unwrap();
        let result = store.insert_user(again).await;
        assert!(matches!(result, Err(StoreError::Duplicate { .. })));
    }

    #[tokio::test]
    async fn test_commit_checkout_decrements_and_clears_cart() {
        let store = InMemoryStore::new();
        let shoes = product(5);
        store.insert_product(shoes.clone()).await.unwrap();

        let user_id = UserId::new();
        let mut cart = Cart::new(user_id);
        cart.add(shoes.id, 2).unwrap();
        store.save_cart(cart).await.unwrap();

        let order = order_for(user_id, vec![(shoes.id, 2)]);
        store.commit_checkout(&order).await.unwrap();

        assert_eq!(store.get_product(shoes.id).await.unwrap().unwrap().stock, 3);
        assert!(store.get_cart(user_id).await.unwrap().unwrap().is_empty());
        assert!(store.get_order(order.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_commit_checkout_is_all_or_nothing() {
        let store = InMemoryStore::new();
        let plenty = product(10);
        let scarce = product(1);
        store.insert_product(plenty.clone()).await.unwrap();
        store.insert_product(scarce.clone()).await.unwrap();

        let order = order_for(UserId::new(), vec![(plenty.id, 3), (scarce.id, 2)]);
        let result = store.commit_checkout(&order).await;

        assert!(matches!(
            result,
            Err(StoreError::InsufficientStock { requested: 2, available: 1, .. })
        ));
        assert_eq!(store.get_product(plenty.id).await.unwrap().unwrap().stock, 10);
        assert_eq!(store.get_product(scarce.id).await.unwrap().unwrap().stock, 1);
        assert!(store.get_order(order.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancellation_requires_expected_status() {
        let store = InMemoryStore::new();
        let shoes = product(5);
        store.insert_product(shoes.clone()).await.unwrap();
        let mut order = order_for(UserId::new(), vec![(shoes.id, 2)]);
        store.commit_checkout(&order).await.unwrap();

        order.transition(OrderStatus::Cancelled).unwrap();
        store
            .commit_cancellation(&order, OrderStatus::Processing)
            .await
            .unwrap();
        assert_eq!(store.get_product(shoes.id).await.unwrap().unwrap().stock, 5);

        // A second cancellation sees the stored Cancelled status
        let result = store
            .commit_cancellation(&order, OrderStatus::Processing)
            .await;
        assert!(matches!(result, Err(StoreError::StatusConflict { .. })));
        assert_eq!(store.get_product(shoes.id).await.unwrap().unwrap().stock, 5);
    }

    #[tokio::test]
    async fn test_cancellation_caps_restored_stock() {
        let store = InMemoryStore::new();
        let mut shoes = product(10);
        store.insert_product(shoes.clone()).await.unwrap();
        let mut order = order_for(UserId::new(), vec![(shoes.id, 4)]);
        store.commit_checkout(&order).await.unwrap();

        shoes.stock = u32::MAX - 1;
        store.update_product(shoes.clone()).await.unwrap();

        order.transition(OrderStatus::Cancelled).unwrap();
        store
            .commit_cancellation(&order, OrderStatus::Processing)
            .await
            .unwrap();
        assert_eq!(store.get_product(shoes.id).await.unwrap().unwrap().stock, u32::MAX);
    }

    #[tokio::test]
    async fn test_query_pagination_newest_first() {
        let store = InMemoryStore::new();
        let mut ids = Vec::new();
        for i in 0..5 {
            let mut p = product(1);
            p.created_at = Utc::now() + chrono::Duration::seconds(i);
            ids.push(p.id);
            store.insert_product(p).await.unwrap();
        }

        let page = store
            .query_products(&ProductQuery::new().page(2).limit(2))
            .await
            .unwrap();

        assert_eq!(page.total, 5);
        assert_eq!(
            page.products.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![ids[2], ids[1]]
        );
    }

    #[tokio::test]
    async fn test_duplicate_review_rejected() {
        let store = InMemoryStore::new();
        let product_id = ProductId::new();
        let user_id = UserId::new();
        let first = Review::new(product_id, user_id, "John", 5, "Great").unwrap();
        let second = Review::new(product_id, user_id, "John", 1, "Changed my mind").unwrap();

        store.insert_review(first).await.unwrap();
        assert!(matches!(
            store.insert_review(second).await,
            Err(StoreError::Duplicate { .. })
        ));
    }

    #[tokio::test]
    async fn test_recompute_rating_reads_current_reviews() {
        let store = InMemoryStore::new();
        let shoes = product(5);
        store.insert_product(shoes.clone()).await.unwrap();

        for rating in [5, 4] {
            let review = Review::new(shoes.id, UserId::new(), "Runner", rating, "Nice").unwrap();
            store.insert_review(review).await.unwrap();
        }
        let summary = store.recompute_rating(shoes.id).await.unwrap();
        assert_eq!(summary, RatingSummary::from_ratings([5, 4]));

        let stored = store.get_product(shoes.id).await.unwrap().unwrap();
        assert_eq!((stored.rating, stored.num_reviews), (4.5, 2));

        assert!(matches!(
            store.recompute_rating(ProductId::new()).await,
            Err(StoreError::NotFound { .. })
        ));
    }
}
