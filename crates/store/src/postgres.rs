use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use common::{Money, OrderId, ProductId, ReviewId, UserId};
use domain::{
    Cart, Category, Order, OrderStatus, PriceBreakdown, Product, RatingSummary, Review, Role, User,
};
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{PgConnection, PgPool, Postgres, Row};
use uuid::Uuid;

use crate::{ProductPage, ProductQuery, Result, Store, StoreError};

const USER_COLUMNS: &str = "id, name, email, role, address, phone, created_at, updated_at";

const PRODUCT_COLUMNS: &str = "id, name, description, price_cents, category, stock, images, \
     rating, num_reviews, featured, brand, sku, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, user_id, items, shipping_address, payment_method, payment, \
     items_price_cents, tax_price_cents, shipping_price_cents, total_price_cents, is_paid, \
     paid_at, status, delivered_at, created_at, updated_at";

const REVIEW_COLUMNS: &str =
    "id, product_id, user_id, user_name, rating, comment, created_at, updated_at";

/// PostgreSQL-backed store implementation.
///
/// Documents with embedded arrays (cart entries, order lines, addresses)
/// are held in JSONB columns.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool to `url`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn corrupt(err: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(err.to_string())
}

fn to_u32(field: &str, value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{field} out of range: {value}")))
}

fn violates(err: &sqlx::Error, constraint: &str) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.constraint() == Some(constraint))
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn row_to_user(row: PgRow) -> Result<User> {
    Ok(User {
        id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        role: row
            .try_get::<String, _>("role")?
            .parse::<Role>()
            .map_err(corrupt)?,
        address: row.try_get("address")?,
        phone: row.try_get("phone")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_product(row: PgRow) -> Result<Product> {
    let images: serde_json::Value = row.try_get("images")?;
    Ok(Product {
        id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: Money::from_cents(row.try_get("price_cents")?),
        category: row
            .try_get::<String, _>("category")?
            .parse::<Category>()
            .map_err(corrupt)?,
        stock: to_u32("stock", row.try_get("stock")?)?,
        images: serde_json::from_value(images)?,
        rating: row.try_get("rating")?,
        num_reviews: to_u32("num_reviews", row.try_get("num_reviews")?)?,
        featured: row.try_get("featured")?,
        brand: row.try_get("brand")?,
        sku: row.try_get("sku")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_cart(row: PgRow) -> Result<Cart> {
    let items: serde_json::Value = row.try_get("items")?;
    Ok(Cart {
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        items: serde_json::from_value(items)?,
        total: Money::from_cents(row.try_get("total_cents")?),
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_order(row: PgRow) -> Result<Order> {
    let items: serde_json::Value = row.try_get("items")?;
    let shipping_address: serde_json::Value = row.try_get("shipping_address")?;
    let payment: serde_json::Value = row.try_get("payment")?;
    Ok(Order {
        id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        items: serde_json::from_value(items)?,
        shipping_address: serde_json::from_value(shipping_address)?,
        payment_method: row.try_get("payment_method")?,
        payment: serde_json::from_value(payment)?,
        pricing: PriceBreakdown {
            items_price: Money::from_cents(row.try_get("items_price_cents")?),
            tax_price: Money::from_cents(row.try_get("tax_price_cents")?),
            shipping_price: Money::from_cents(row.try_get("shipping_price_cents")?),
            total_price: Money::from_cents(row.try_get("total_price_cents")?),
        },
        is_paid: row.try_get("is_paid")?,
        paid_at: row.try_get("paid_at")?,
        status: row
            .try_get::<String, _>("status")?
            .parse::<OrderStatus>()
            .map_err(corrupt)?,
        delivered_at: row.try_get("delivered_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_review(row: PgRow) -> Result<Review> {
    let rating: i16 = row.try_get("rating")?;
    Ok(Review {
        id: ReviewId::from_uuid(row.try_get::<Uuid, _>("id")?),
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        user_name: row.try_get("user_name")?,
        rating: u8::try_from(rating).map_err(corrupt)?,
        comment: row.try_get("comment")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Builds the WHERE clause for a catalog query; returns it with the number of placeholders used.
fn product_filter_sql(query: &ProductQuery) -> (String, usize) {
    let mut sql = String::from(" WHERE 1=1");
    let mut param_count = 0;

    if query.category.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND category = ${param_count}"));
    }
    if query.keyword.is_some() {
        param_count += 1;
        sql.push_str(&format!(
            " AND (name ILIKE ${param_count} OR description ILIKE ${param_count})"
        ));
    }
    if query.min_price.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND price_cents >= ${param_count}"));
    }
    if query.max_price.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND price_cents <= ${param_count}"));
    }
    if query.featured.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND featured = ${param_count}"));
    }

    (sql, param_count)
}

fn bind_product_filters<'q>(
    mut q: Query<'q, Postgres, PgArguments>,
    query: &ProductQuery,
) -> Query<'q, Postgres, PgArguments> {
    if let Some(category) = query.category {
        q = q.bind(category.as_str());
    }
    if let Some(keyword) = &query.keyword {
        q = q.bind(format!("%{}%", escape_like(keyword)));
    }
    if let Some(min) = query.min_price {
        q = q.bind(min.cents());
    }
    if let Some(max) = query.max_price {
        q = q.bind(max.cents());
    }
    if let Some(featured) = query.featured {
        q = q.bind(featured);
    }
    q
}

async fn insert_order(conn: &mut PgConnection, order: &Order) -> Result<()> {
    sqlx::query(&format!(
        "INSERT INTO orders ({ORDER_COLUMNS}) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)"
    ))
    .bind(order.id.as_uuid())
    .bind(order.user_id.as_uuid())
    .bind(serde_json::to_value(&order.items)?)
    .bind(serde_json::to_value(&order.shipping_address)?)
    .bind(&order.payment_method)
    .bind(serde_json::to_value(&order.payment)?)
    .bind(order.pricing.items_price.cents())
    .bind(order.pricing.tax_price.cents())
    .bind(order.pricing.shipping_price.cents())
    .bind(order.pricing.total_price.cents())
    .bind(order.is_paid)
    .bind(order.paid_at)
    .bind(order.status.as_str())
    .bind(order.delivered_at)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Writes `order`'s status fields if the stored status is still `expected`.
async fn compare_and_set_status(
    conn: &mut PgConnection,
    order: &Order,
    expected: OrderStatus,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE orders SET status = $1, delivered_at = $2, updated_at = $3
        WHERE id = $4 AND status = $5
        "#,
    )
    .bind(order.status.as_str())
    .bind(order.delivered_at)
    .bind(order.updated_at)
    .bind(order.id.as_uuid())
    .bind(expected.as_str())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    let actual: Option<String> = sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
        .bind(order.id.as_uuid())
        .fetch_optional(&mut *conn)
        .await?;

    match actual {
        None => Err(StoreError::not_found("Order", order.id)),
        Some(actual) => Err(StoreError::StatusConflict {
            order_id: order.id,
            expected,
            actual: actual.parse().map_err(corrupt)?,
        }),
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn insert_user(&self, user: User) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(&user.address)
        .bind(&user.phone)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, "unique_user_email") {
                return StoreError::Duplicate {
                    entity: "User",
                    detail: format!("email {} already registered", user.email),
                };
            }
            StoreError::Database(e)
        })?;
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_user).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_user).transpose()
    }

    async fn update_user(&self, user: User) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE users SET name = $1, email = $2, role = $3, address = $4, phone = $5, updated_at = $6
            WHERE id = $7
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(&user.address)
        .bind(&user.phone)
        .bind(user.updated_at)
        .bind(user.id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, "unique_user_email") {
                return StoreError::Duplicate {
                    entity: "User",
                    detail: format!("email {} already registered", user.email),
                };
            }
            StoreError::Database(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("User", user.id));
        }
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_user).collect()
    }

    async fn insert_product(&self, product: Product) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO products ({PRODUCT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"
        ))
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(product.category.as_str())
        .bind(i64::from(product.stock))
        .bind(serde_json::to_value(&product.images)?)
        .bind(product.rating)
        .bind(i64::from(product.num_reviews))
        .bind(product.featured)
        .bind(&product.brand)
        .bind(&product.sku)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_product).transpose()
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let uuids: Vec<Uuid> = ids.iter().map(ProductId::as_uuid).collect();
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
        ))
        .bind(uuids)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_product).collect()
    }

    async fn query_products(&self, query: &ProductQuery) -> Result<ProductPage> {
        let (filter, param_count) = product_filter_sql(query);

        let count_sql = format!("SELECT COUNT(*) AS total FROM products{filter}");
        let total: i64 = bind_product_filters(sqlx::query(&count_sql), query)
            .fetch_one(&self.pool)
            .await?
            .try_get("total")?;

        let page_sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products{filter} \
             ORDER BY created_at DESC, id ASC LIMIT ${} OFFSET ${}",
            param_count + 1,
            param_count + 2
        );
        let rows = bind_product_filters(sqlx::query(&page_sql), query)
            .bind(i64::from(query.limit))
            .bind(query.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(ProductPage {
            products: rows
                .into_iter()
                .map(row_to_product)
                .collect::<Result<_>>()?,
            total: total as u64,
        })
    }

    async fn update_product(&self, product: Product) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = $1, description = $2, price_cents = $3, category = $4, stock = $5,
                images = $6, featured = $7, brand = $8, sku = $9, updated_at = $10
            WHERE id = $11
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(product.category.as_str())
        .bind(i64::from(product.stock))
        .bind(serde_json::to_value(&product.images)?)
        .bind(product.featured)
        .bind(&product.brand)
        .bind(&product.sku)
        .bind(product.updated_at)
        .bind(product.id.as_uuid())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Product", product.id));
        }
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn recompute_rating(&self, id: ProductId) -> Result<RatingSummary> {
        let mut tx = self.pool.begin().await?;

        // The row lock serializes recomputes of one product; each one reads
        // the reviews committed before it acquired the lock.
        let locked = sqlx::query("SELECT id FROM products WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(StoreError::not_found("Product", id));
        }

        let ratings: Vec<i16> =
            sqlx::query_scalar("SELECT rating FROM reviews WHERE product_id = $1")
                .bind(id.as_uuid())
                .fetch_all(&mut *tx)
                .await?;
        let ratings = ratings
            .into_iter()
            .map(|r| u8::try_from(r).map_err(|_| corrupt("review rating out of range")))
            .collect::<Result<Vec<u8>>>()?;
        let summary = RatingSummary::from_ratings(ratings);

        sqlx::query("UPDATE products SET rating = $1, num_reviews = $2 WHERE id = $3")
            .bind(summary.rating)
            .bind(i64::from(summary.num_reviews))
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(summary)
    }

    async fn count_products(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn get_cart(&self, user_id: UserId) -> Result<Option<Cart>> {
        let row =
            sqlx::query("SELECT user_id, items, total_cents, updated_at FROM carts WHERE user_id = $1")
                .bind(user_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;
        row.map(row_to_cart).transpose()
    }

    async fn save_cart(&self, cart: Cart) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO carts (user_id, items, total_cents, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE SET
                items = EXCLUDED.items,
                total_cents = EXCLUDED.total_cents,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(cart.user_id.as_uuid())
        .bind(serde_json::to_value(&cart.items)?)
        .bind(cart.total.cents())
        .bind(cart.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_order).transpose()
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_order).collect()
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_order).collect()
    }

    async fn has_paid_order_with_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool> {
        let needle = serde_json::json!([{ "product_id": product_id }]);
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM orders WHERE user_id = $1 AND is_paid AND items @> $2)",
        )
        .bind(user_id.as_uuid())
        .bind(needle)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    #[tracing::instrument(skip(self, order), fields(order_id = %order.id))]
    async fn commit_checkout(&self, order: &Order) -> Result<()> {
        // Sorted so concurrent checkouts lock product rows in the same order
        let mut wanted: BTreeMap<ProductId, u32> = BTreeMap::new();
        for line in &order.items {
            *wanted.entry(line.product_id).or_default() += line.quantity;
        }

        let mut tx = self.pool.begin().await?;

        for (&product_id, &requested) in &wanted {
            let result = sqlx::query(
                r#"
                UPDATE products SET stock = stock - $1, updated_at = $2
                WHERE id = $3 AND stock >= $1
                "#,
            )
            .bind(i64::from(requested))
            .bind(Utc::now())
            .bind(product_id.as_uuid())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
                        .bind(product_id.as_uuid())
                        .fetch_optional(&mut *tx)
                        .await?;
                // Dropping the transaction rolls back earlier decrements
                return Err(match available {
                    None => StoreError::not_found("Product", product_id),
                    Some(available) => StoreError::InsufficientStock {
                        product_id,
                        requested,
                        available: to_u32("stock", available)?,
                    },
                });
            }
        }

        insert_order(&mut tx, order).await?;

        sqlx::query(
            "UPDATE carts SET items = '[]'::jsonb, total_cents = 0, updated_at = $1 WHERE user_id = $2",
        )
        .bind(Utc::now())
        .bind(order.user_id.as_uuid())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_order_status(&self, order: &Order, expected: OrderStatus) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        compare_and_set_status(&mut conn, order, expected).await
    }

    #[tracing::instrument(skip(self, order), fields(order_id = %order.id))]
    async fn commit_cancellation(&self, order: &Order, expected: OrderStatus) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        compare_and_set_status(&mut tx, order, expected).await?;

        for line in &order.items {
            // Capped at the largest stock a product can hold
            sqlx::query(
                "UPDATE products SET stock = LEAST(stock + $1, $2), updated_at = $3 WHERE id = $4",
            )
            .bind(i64::from(line.quantity))
            .bind(i64::from(u32::MAX))
            .bind(Utc::now())
            .bind(line.product_id.as_uuid())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn insert_review(&self, review: Review) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO reviews ({REVIEW_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(review.id.as_uuid())
        .bind(review.product_id.as_uuid())
        .bind(review.user_id.as_uuid())
        .bind(&review.user_name)
        .bind(i16::from(review.rating))
        .bind(&review.comment)
        .bind(review.created_at)
        .bind(review.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, "unique_review_per_user") {
                return StoreError::Duplicate {
                    entity: "Review",
                    detail: format!(
                        "user {} already reviewed product {}",
                        review.user_id, review.product_id
                    ),
                };
            }
            if violates(&e, "reviews_product_id_fkey") {
                return StoreError::not_found("Product", review.product_id);
            }
            StoreError::Database(e)
        })?;
        Ok(())
    }

    async fn get_review(&self, id: ReviewId) -> Result<Option<Review>> {
        let row = sqlx::query(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_review).transpose()
    }

    async fn list_reviews_for_product(&self, product_id: ProductId) -> Result<Vec<Review>> {
        let rows = sqlx::query(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE product_id = $1 ORDER BY created_at DESC"
        ))
        .bind(product_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_review).collect()
    }

    async fn update_review(&self, review: Review) -> Result<()> {
        let result =
            sqlx::query("UPDATE reviews SET rating = $1, comment = $2, updated_at = $3 WHERE id = $4")
                .bind(i16::from(review.rating))
                .bind(&review.comment)
                .bind(review.updated_at)
                .bind(review.id.as_uuid())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Review", review.id));
        }
        Ok(())
    }

    async fn delete_review(&self, id: ReviewId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_quotes_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn filter_sql_numbers_placeholders() {
        let query = ProductQuery::new()
            .category(Category::Books)
            .keyword("rust")
            .featured(true);
        let (sql, count) = product_filter_sql(&query);

        assert_eq!(count, 3);
        assert!(sql.contains("category = $1"));
        assert!(sql.contains("name ILIKE $2 OR description ILIKE $2"));
        assert!(sql.contains("featured = $3"));
    }
}
