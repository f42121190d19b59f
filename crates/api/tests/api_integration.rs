//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use commerce::{InMemoryPaymentGateway, PaymentGateway};
use common::{Money, UserId};
use domain::{Category, Product, ProductDraft};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::{InMemoryStore, Store};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    app: axum::Router,
    store: InMemoryStore,
    payment: Arc<InMemoryPaymentGateway>,
}

#[derive(Clone, Copy)]
enum As {
    Anonymous,
    User(UserId),
    Admin,
}

impl TestApp {
    fn new() -> Self {
        let store = InMemoryStore::new();
        let payment = Arc::new(InMemoryPaymentGateway::new());
        let state = api::create_state(
            store.clone(),
            payment.clone() as Arc<dyn PaymentGateway>,
            "usd",
        );
        let app = api::create_app(state, get_metrics_handle());
        Self {
            app,
            store,
            payment,
        }
    }

    async fn send(&self, method: &str, uri: &str, who: As, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        match who {
            As::Anonymous => {}
            As::User(id) => {
                builder = builder.header("x-user-id", id.to_string());
            }
            As::Admin => {
                builder = builder
                    .header("x-user-id", UserId::new().to_string())
                    .header("x-user-role", "admin");
            }
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn product(&self, name: &str, cents: i64, stock: i64, featured: bool) -> Product {
        let product = Product::create(ProductDraft {
            name: name.to_string(),
            description: format!("{name} for integration testing"),
            price: Money::from_cents(cents),
            category: Category::Electronics,
            stock,
            images: vec![],
            featured,
            brand: None,
            sku: None,
        })
        .unwrap();
        self.store.insert_product(product.clone()).await.unwrap();
        product
    }

    async fn register(&self, name: &str, email: &str) -> UserId {
        let (status, body) = self
            .send(
                "POST",
                "/users",
                As::Anonymous,
                Some(json!({ "name": name, "email": email })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        UserId::parse(body["data"]["id"].as_str().unwrap()).unwrap()
    }

    async fn checkout(&self, user: UserId) -> (StatusCode, Value) {
        self.send(
            "POST",
            "/orders",
            As::User(user),
            Some(json!({
                "shipping_address": {
                    "street": "1 Main St",
                    "city": "Springfield",
                    "postal_code": "12345",
                    "country": "US"
                },
                "payment_method_id": "pm_card_visa"
            })),
        )
        .await
    }

    async fn buy(&self, user: UserId, product: &Product, quantity: u32) -> Value {
        let (status, _) = self
            .send(
                "POST",
                "/cart",
                As::User(user),
                Some(json!({ "product_id": product.id, "quantity": quantity })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = self.checkout(user).await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"].clone()
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    let (status, body) = app.send("GET", "/health", As::Anonymous, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = TestApp::new();
    let response = app
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_protected_routes_require_identity() {
    let app = TestApp::new();

    for (method, uri) in [("GET", "/cart"), ("GET", "/orders"), ("GET", "/users/me")] {
        let (status, body) = app.send(method, uri, As::Anonymous, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn test_register_and_profile() {
    let app = TestApp::new();
    let id = app.register("Ada Lovelace", "Ada@Example.com").await;

    let (status, body) = app.send("GET", "/users/me", As::User(id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "ada@example.com");

    let (status, body) = app
        .send(
            "PUT",
            "/users/me",
            As::User(id),
            Some(json!({ "phone": "555-0100" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["phone"], "555-0100");

    let (status, body) = app
        .send(
            "POST",
            "/users",
            As::Anonymous,
            Some(json!({ "name": "Ada Again", "email": "ada@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_product_listing_and_lookup() {
    let app = TestApp::new();
    let watch = app.product("Smart Watch", 29999, 30, true).await;
    app.product("Wireless Headphones", 19999, 50, false).await;

    let (status, body) = app.send("GET", "/products", As::Anonymous, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 2);
    assert_eq!(body["total"], 2);
    assert_eq!(body["pages"], 1);

    let (_, body) = app
        .send(
            "GET",
            "/products?keyword=watch&max_price_cents=30000",
            As::Anonymous,
            None,
        )
        .await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["name"], "Smart Watch");

    let (status, body) = app
        .send("GET", "/products/featured", As::Anonymous, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, body) = app
        .send("GET", &format!("/products/{}", watch.id), As::Anonymous, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["price_cents"], 29999);
}

#[tokio::test]
async fn test_bad_product_requests() {
    let app = TestApp::new();

    let (status, _) = app
        .send("GET", "/products/not-a-uuid", As::Anonymous, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(
            "GET",
            &format!("/products/{}", uuid::Uuid::new_v4()),
            As::Anonymous,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .send("GET", "/products?category=groceries", As::Anonymous, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send("GET", "/products?page=0", As::Anonymous, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cart_flow() {
    let app = TestApp::new();
    let user = app.register("Cart User", "cart@example.com").await;
    let product = app.product("Smart Watch", 5000, 3, false).await;

    let (status, body) = app
        .send(
            "POST",
            "/cart",
            As::User(user),
            Some(json!({ "product_id": product.id, "quantity": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_cents"], 10000);

    let (status, _) = app
        .send(
            "POST",
            "/cart",
            As::User(user),
            Some(json!({ "product_id": product.id, "quantity": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(
            "PUT",
            &format!("/cart/{}", product.id),
            As::User(user),
            Some(json!({ "quantity": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"][0]["quantity"], 1);

    let (status, body) = app
        .send(
            "DELETE",
            &format!("/cart/{}", product.id),
            As::User(user),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 0);

    let (status, _) = app
        .send("POST", "/cart", As::User(user), Some(json!({ "quantity": 1 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_checkout_creates_order() {
    let app = TestApp::new();
    let user = app.register("Buyer", "buyer@example.com").await;
    let product = app.product("Headphones", 5000, 10, false).await;

    let order = app.buy(user, &product, 2).await;
    assert_eq!(order["items_price_cents"], 10000);
    assert_eq!(order["tax_price_cents"], 1000);
    assert_eq!(order["shipping_price_cents"], 1000);
    assert_eq!(order["total_price_cents"], 12000);
    assert_eq!(order["status"], "Processing");
    assert_eq!(order["is_paid"], true);

    let (_, cart) = app.send("GET", "/cart", As::User(user), None).await;
    assert_eq!(cart["data"]["items"].as_array().unwrap().len(), 0);

    let stored = app.store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(stored.stock, 8);

    let (status, body) = app.send("GET", "/orders", As::User(user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let order_uri = format!("/orders/{}", order["id"].as_str().unwrap());
    let (status, _) = app
        .send("GET", &order_uri, As::User(UserId::new()), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.send("GET", &order_uri, As::Admin, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_checkout_failures() {
    let app = TestApp::new();
    let user = app.register("Buyer", "buyer@example.com").await;
    let product = app.product("Headphones", 5000, 10, false).await;

    let (status, body) = app.checkout(user).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cart is empty");

    app.send(
        "POST",
        "/cart",
        As::User(user),
        Some(json!({ "product_id": product.id, "quantity": 1 })),
    )
    .await;
    app.payment.set_decline(true);

    let (status, body) = app.checkout(user).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["success"], false);

    let stored = app.store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(stored.stock, 10);
    let (_, cart) = app.send("GET", "/cart", As::User(user), None).await;
    assert_eq!(cart["data"]["items"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .send(
            "POST",
            "/orders",
            As::User(user),
            Some(json!({ "payment_method_id": "pm_card_visa" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancel_and_admin_status_updates() {
    let app = TestApp::new();
    let user = app.register("Buyer", "buyer@example.com").await;
    let product = app.product("Headphones", 5000, 10, false).await;

    let first = app.buy(user, &product, 1).await;
    let cancel_uri = format!("/orders/{}/cancel", first["id"].as_str().unwrap());
    let (status, body) = app.send("PUT", &cancel_uri, As::User(user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "Cancelled");
    let (status, _) = app.send("PUT", &cancel_uri, As::User(user), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let second = app.buy(user, &product, 1).await;
    let admin_uri = format!("/admin/orders/{}", second["id"].as_str().unwrap());
    let (status, _) = app
        .send(
            "PUT",
            &admin_uri,
            As::User(user),
            Some(json!({ "status": "Shipped" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send("PUT", &admin_uri, As::Admin, Some(json!({ "status": "Shipped" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "Shipped");

    let cancel_uri = format!("/orders/{}/cancel", second["id"].as_str().unwrap());
    let (status, _) = app.send("PUT", &cancel_uri, As::User(user), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .send("PUT", &admin_uri, As::Admin, Some(json!({ "status": "Lost" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_review_rules() {
    let app = TestApp::new();
    let product = app.product("Smart Watch", 5000, 10, false).await;
    let buyer = app.register("Buyer", "buyer@example.com").await;
    let browser = app.register("Browser", "browser@example.com").await;
    app.buy(buyer, &product, 1).await;

    let uri = format!("/reviews/product/{}", product.id);
    let review = json!({ "rating": 4, "comment": "Does the job" });

    let (status, _) = app
        .send("POST", &uri, As::User(browser), Some(review.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send("POST", &uri, As::User(buyer), Some(review.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let review_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app.send("POST", &uri, As::User(buyer), Some(review)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app.send("GET", &uri, As::Anonymous, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (_, body) = app
        .send("GET", &format!("/products/{}", product.id), As::Anonymous, None)
        .await;
    assert_eq!(body["data"]["rating"], 4.0);
    assert_eq!(body["data"]["num_reviews"], 1);

    let (status, body) = app
        .send(
            "DELETE",
            &format!("/reviews/{review_id}"),
            As::User(buyer),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Review deleted");
}

#[tokio::test]
async fn test_admin_product_management() {
    let app = TestApp::new();
    let draft = json!({
        "name": "Coffee Maker",
        "description": "Programmable coffee maker with thermal carafe",
        "price_cents": 7999,
        "category": "Home",
        "stock": 40
    });

    let (status, _) = app
        .send(
            "POST",
            "/admin/products",
            As::User(UserId::new()),
            Some(draft.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send("POST", "/admin/products", As::Admin, Some(draft))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .send("GET", "/admin/dashboard", As::Admin, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_products"], 1);

    let (status, _) = app
        .send(
            "DELETE",
            &format!("/admin/products/{id}"),
            As::Admin,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send("GET", &format!("/products/{id}"), As::Anonymous, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
