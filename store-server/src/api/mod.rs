//! API routes

pub mod health;
pub mod orders;
pub mod skus;
pub mod stock;
pub mod webhook;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Payment gateway webhook (signature-verified, raw body)
    let webhook = Router::new().route("/webhook/payment", post(webhook::handle_webhook));

    // Storefront checkout + order timeline
    let orders = Router::new()
        .route("/api/orders", post(orders::checkout))
        .route("/api/orders/{id}", get(orders::get_order))
        .route("/api/orders/{id}/cancel", post(orders::cancel))
        .route("/api/orders/{id}/ship", post(orders::ship))
        .route("/api/orders/{id}/deliver", post(orders::deliver));

    // Merchant back-office: SKUs and stock
    let skus = Router::new()
        .route("/api/skus", post(skus::create))
        .route("/api/skus/resolve", post(skus::resolve))
        .route("/api/skus/{id}", delete(skus::deactivate));
    let stock = Router::new()
        .route("/api/stock/alerts", get(stock::low_stock))
        .route("/api/stock/adjust", post(stock::adjust))
        .route("/api/stock/transfer", post(stock::transfer))
        .route("/api/stock/{sku_id}", get(stock::get_level))
        .route("/api/stock/{sku_id}/movements", get(stock::movements));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(webhook)
        .merge(orders)
        .merge(skus)
        .merge(stock)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
