//! HTTP API server for the storefront backend.
//!
//! REST endpoints over the [`commerce`] services, wrapped in a
//! `{ success, data, message, count }` envelope, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod extract;
pub mod response;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use commerce::{Commerce, PaymentGateway};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store + Clone> {
    pub commerce: Commerce<S>,
}

/// Wires every service to `store` and `payment`.
pub fn create_state<S: Store + Clone + 'static>(
    store: S,
    payment: Arc<dyn PaymentGateway>,
    currency: &str,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        commerce: Commerce::new(store, payment, currency),
    })
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    use routes::{admin, cart, health, metrics, orders, products, reviews, users};

    let metrics_router = Router::new()
        .route("/metrics", get(metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(health::check))
        .route("/users", post(users::register::<S>))
        .route("/users/me", get(users::me::<S>).put(users::update_me::<S>))
        .route("/products", get(products::list::<S>))
        .route("/products/featured", get(products::featured::<S>))
        .route("/products/{id}", get(products::get::<S>))
        .route(
            "/cart",
            get(cart::get::<S>)
                .post(cart::add::<S>)
                .delete(cart::clear::<S>),
        )
        .route(
            "/cart/{product_id}",
            put(cart::update::<S>).delete(cart::remove::<S>),
        )
        .route("/orders", post(orders::create::<S>).get(orders::list::<S>))
        .route("/orders/{id}", get(orders::get::<S>))
        .route("/orders/{id}/cancel", put(orders::cancel::<S>))
        .route(
            "/reviews/product/{product_id}",
            get(reviews::list_for_product::<S>).post(reviews::create::<S>),
        )
        .route(
            "/reviews/{id}",
            put(reviews::update::<S>).delete(reviews::delete::<S>),
        )
        .route("/admin/dashboard", get(admin::dashboard::<S>))
        .route("/admin/users", get(admin::users::<S>))
        .route("/admin/orders", get(admin::orders::<S>))
        .route("/admin/orders/{id}", put(admin::update_order_status::<S>))
        .route("/admin/products", post(admin::create_product::<S>))
        .route(
            "/admin/products/{id}",
            put(admin::update_product::<S>).delete(admin::delete_product::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
