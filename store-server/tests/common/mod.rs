//! Shared fixtures for the integration suites
#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;

use shared::models::order::{CheckoutLine, CheckoutRequest, OrderDetail};
use shared::models::sku::{Product, Sku, VariantAttribute};
use shared::models::stock::Warehouse;

use store_server::db::memory::MemoryStore;
use store_server::db::{CatalogStore, StockStore};
use store_server::notify::{NoopNotifier, Notifier};
use store_server::state::AppState;
use store_server::webhook::sign;

pub const WEBHOOK_SECRET: &str = "test-webhook-secret";
pub const MAIN_WAREHOUSE: i64 = 1;

/// In-memory application wiring: same components as production, fake store
pub async fn test_state() -> (AppState, Arc<MemoryStore>) {
    test_state_with_notifier(Arc::new(NoopNotifier)).await
}

/// Same wiring with a custom notification boundary
pub async fn test_state_with_notifier(
    notifier: Arc<dyn Notifier>,
) -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    store
        .create_warehouse(&Warehouse {
            id: MAIN_WAREHOUSE,
            name: "主仓库".into(),
            is_default: true,
        })
        .await
        .unwrap();
    let state = AppState::from_parts(
        store.clone(),
        notifier,
        MAIN_WAREHOUSE,
        WEBHOOK_SECRET.into(),
    );
    (state, store)
}

/// Seed one product with one navy/M SKU and `available` units on hand
pub async fn seed_catalog(
    store: &Arc<MemoryStore>,
    product_id: i64,
    sku_id: i64,
    available: i32,
) -> Sku {
    seed_catalog_with_attrs(
        store,
        product_id,
        sku_id,
        available,
        &[("color", "navy"), ("size", "M")],
    )
    .await
}

pub async fn seed_catalog_with_attrs(
    store: &Arc<MemoryStore>,
    product_id: i64,
    sku_id: i64,
    available: i32,
    attrs: &[(&str, &str)],
) -> Sku {
    store
        .create_product(&Product {
            id: product_id,
            name: format!("测试商品 {product_id}"),
            image: "https://img.example.com/p.jpg".into(),
            is_active: true,
        })
        .await
        .unwrap();
    let sku = Sku {
        id: sku_id,
        product_id,
        sku_code: format!("TST-{sku_id}"),
        attributes: attrs
            .iter()
            .map(|(n, v)| VariantAttribute::new(*n, *v))
            .collect(),
        price: Decimal::new(2499, 2),
        is_active: true,
        created_at: 0,
    };
    store.create_sku(&sku).await.unwrap();
    store
        .seed_stock(sku_id, MAIN_WAREHOUSE, available, 5, None, 0)
        .await
        .unwrap();
    sku
}

/// Checkout one line of `quantity` units against the seeded navy/M SKU
pub async fn checkout_one(
    state: &AppState,
    product_id: i64,
    quantity: i32,
) -> OrderDetail {
    state
        .checkout
        .create_order(CheckoutRequest {
            lines: vec![CheckoutLine {
                product_id,
                attributes: vec![
                    VariantAttribute::new("color", "navy"),
                    VariantAttribute::new("size", "M"),
                ],
                quantity,
            }],
            shipping_address: "上海市测试路 1 号".into(),
        })
        .await
        .expect("checkout should succeed")
}

/// Serialize a gateway payload and sign it the way the provider would
pub fn signed_payload(payload: &serde_json::Value) -> (Vec<u8>, String) {
    let body = serde_json::to_vec(payload).unwrap();
    let signature = sign(&body, WEBHOOK_SECRET);
    (body, signature)
}

/// Current counters for a SKU at the main warehouse
pub async fn counters(store: &Arc<MemoryStore>, sku_id: i64) -> (i32, i32) {
    let rows = store.stock_rows(sku_id, Some(MAIN_WAREHOUSE)).await.unwrap();
    rows.first()
        .map(|r| (r.available, r.reserved))
        .unwrap_or((0, 0))
}
