//! HTTP API server for the storefront checkout.
//!
//! Provides the payment and email endpoints the storefront client calls
//! directly, plus cart, checkout and order endpoints backed by the
//! checkout orchestrator, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use checkout::{CheckoutOrchestrator, NotificationDispatcher, Notifier, PaymentGateway};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S> {
    pub checkout: CheckoutOrchestrator<S>,
    pub notifications: NotificationDispatcher,
}

impl<S: Store + Clone + 'static> AppState<S> {
    pub fn payments(&self) -> &Arc<dyn PaymentGateway> {
        self.checkout.payments()
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/api/stripe/create-payment-intent",
            post(routes::stripe::create_payment_intent::<S>),
        )
        .route(
            "/api/stripe/payment-methods/{id}",
            get(routes::stripe::payment_method::<S>),
        )
        .route(
            "/api/email/send-order-emails",
            post(routes::email::send_order_emails::<S>),
        )
        .route("/api/carts", post(routes::carts::create::<S>))
        .route("/api/carts/{id}", get(routes::carts::get::<S>))
        .route("/api/carts/{id}/items", put(routes::carts::put_item::<S>))
        .route(
            "/api/carts/{id}/items/{product}",
            axum::routing::delete(routes::carts::remove_item::<S>),
        )
        .route("/api/checkout", post(routes::checkout::start::<S>))
        .route("/api/checkout/{id}", get(routes::checkout::get::<S>))
        .route(
            "/api/checkout/{id}/shipping",
            post(routes::checkout::shipping::<S>),
        )
        .route(
            "/api/checkout/{id}/sign-in",
            post(routes::checkout::sign_in::<S>),
        )
        .route(
            "/api/checkout/{id}/decline-sign-in",
            post(routes::checkout::decline_sign_in::<S>),
        )
        .route(
            "/api/checkout/{id}/account",
            post(routes::checkout::account::<S>),
        )
        .route(
            "/api/checkout/{id}/payment-intent",
            post(routes::checkout::payment_intent::<S>),
        )
        .route(
            "/api/checkout/{id}/payment",
            post(routes::checkout::payment::<S>),
        )
        .route("/api/checkout/{id}/back", post(routes::checkout::back::<S>))
        .route("/api/orders/{id}", get(routes::orders::get::<S>))
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

/// Creates the application state over a store and the two remote services.
pub fn create_default_state<S: Store + Clone + 'static>(
    store: S,
    payments: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
) -> Arc<AppState<S>> {
    let checkout = CheckoutOrchestrator::new(store, payments, notifier.clone());
    let notifications = NotificationDispatcher::new(notifier);

    Arc::new(AppState {
        checkout,
        notifications,
    })
}
