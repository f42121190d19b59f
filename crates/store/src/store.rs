use async_trait::async_trait;
use common::{OrderId, ProductId, ReviewId, UserId};
use domain::{Cart, Order, OrderStatus, Product, RatingSummary, Review, User};

use crate::{ProductPage, ProductQuery, Result};

/// Core trait for storefront persistence.
///
/// Every method is a single unit of work. The `commit_*` methods group
/// several writes that must land together: either all of them are applied
/// or none are. All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Store: Send + Sync {
    // -- Users --

    /// Inserts a user. Fails with `Duplicate` if the email is taken.
    async fn insert_user(&self, user: User) -> Result<()>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Replaces a user record. Fails with `Duplicate` if the new email is taken.
    async fn update_user(&self, user: User) -> Result<()>;

    /// All users, newest first.
    async fn list_users(&self) -> Result<Vec<User>>;

    // -- Catalog --

    async fn insert_product(&self, product: Product) -> Result<()>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Fetches the products that exist among `ids`, in no particular order.
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>>;

    /// Runs a filtered, paginated catalog query.
    async fn query_products(&self, query: &ProductQuery) -> Result<ProductPage>;

    /// Replaces a product's editable fields. Fails with `NotFound` if absent.
    async fn update_product(&self, product: Product) -> Result<()>;

    /// Removes a product and its reviews. Returns false if it did not exist.
    async fn delete_product(&self, id: ProductId) -> Result<bool>;

    /// Recomputes a product's derived rating fields from its current reviews.
    ///
    /// Reading the reviews and writing the summary happen as one unit, so
    /// overlapping review mutations cannot leave a summary built from an
    /// older set of reviews. Fails with `NotFound` if the product is absent.
    async fn recompute_rating(&self, id: ProductId) -> Result<RatingSummary>;

    async fn count_products(&self) -> Result<u64>;

    // -- Carts --

    async fn get_cart(&self, user_id: UserId) -> Result<Option<Cart>>;

    /// Inserts or replaces the cart owned by `cart.user_id`.
    async fn save_cart(&self, cart: Cart) -> Result<()>;

    // -- Orders --

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Orders placed by a user, newest first.
    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// All orders, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>>;

    /// Returns true if the user holds a paid order containing the product.
    async fn has_paid_order_with_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool>;

    /// Atomically places an order.
    ///
    /// For every line item the product's stock is decremented only if it
    /// stays non-negative; then the order is inserted and the owner's cart
    /// is emptied. If any decrement fails with `InsufficientStock` (or the
    /// product is gone, `NotFound`) nothing is written.
    async fn commit_checkout(&self, order: &Order) -> Result<()>;

    /// Atomically writes a status change made on `order`.
    ///
    /// Fails with `StatusConflict` unless the stored status equals `expected`.
    async fn update_order_status(&self, order: &Order, expected: OrderStatus) -> Result<()>;

    /// Atomically writes a cancellation and restores every line item's stock.
    ///
    /// Fails with `StatusConflict` unless the stored status equals `expected`.
    async fn commit_cancellation(&self, order: &Order, expected: OrderStatus) -> Result<()>;

    // -- Reviews --

    /// Inserts a review. Fails with `Duplicate` if the user already reviewed the product.
    async fn insert_review(&self, review: Review) -> Result<()>;

    async fn get_review(&self, id: ReviewId) -> Result<Option<Review>>;

    /// Reviews of a product, newest first.
    async fn list_reviews_for_product(&self, product_id: ProductId) -> Result<Vec<Review>>;

    async fn update_review(&self, review: Review) -> Result<()>;

    /// Returns false if the review did not exist.
    async fn delete_review(&self, id: ReviewId) -> Result<bool>;
}
