//! Storage layer
//!
//! Access to persistent state goes through the four store traits below, one
//! per ownership area:
//!
//! | Trait | Owns | Written by |
//! |-------|------|-----------|
//! | `CatalogStore` | products, SKUs | merchant SKU management |
//! | `StockStore` | stock rows, movement log, warehouses | stock ledger |
//! | `OrderStore` | orders, items, tracking timeline | checkout + state machine |
//! | `WebhookStore` | webhook events, payment records | webhook gate |
//!
//! Components receive `Arc<dyn Store>` at construction, so the PostgreSQL
//! implementation ([`PgStore`]) and the in-process fake
//! ([`memory::MemoryStore`]) are interchangeable.
//!
//! Counter mutations (`reserve`, `release`, `deduct`, `adjust`, `transfer`,
//! `seed_stock`) are transactional per call: the guarded counter update and
//! its movement row commit together or not at all, and no intermediate state
//! is observable.

pub mod memory;
mod postgres;

mod catalog;
mod orders;
mod stock;
mod webhook;

pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;

use shared::models::order::{Order, OrderItem, OrderStatus, OrderTracking};
use shared::models::payment::{Payment, WebhookEvent};
use shared::models::sku::{Product, Sku};
use shared::models::stock::{StockInfo, StockMovement, Warehouse};

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Persisted data violates a model invariant (bad enum string, missing
    /// stock row for a referenced SKU, ...)
    #[error("data integrity error: {0}")]
    Integrity(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Product and SKU metadata
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn create_product(&self, product: &Product) -> StoreResult<()>;
    async fn get_product(&self, id: i64) -> StoreResult<Option<Product>>;

    async fn create_sku(&self, sku: &Sku) -> StoreResult<()>;
    async fn get_sku(&self, id: i64) -> StoreResult<Option<Sku>>;
    /// All SKUs of a product, active or not, ordered by id
    async fn skus_for_product(&self, product_id: i64) -> StoreResult<Vec<Sku>>;
    /// Soft delete; returns false when the SKU does not exist
    async fn deactivate_sku(&self, id: i64) -> StoreResult<bool>;
}

/// Stock counters and the append-only movement log
#[async_trait]
pub trait StockStore: Send + Sync {
    async fn create_warehouse(&self, warehouse: &Warehouse) -> StoreResult<()>;
    async fn get_warehouse(&self, id: i64) -> StoreResult<Option<Warehouse>>;

    /// Stock rows for a SKU — one per warehouse, or the single matching row
    async fn stock_rows(
        &self,
        sku_id: i64,
        warehouse_id: Option<i64>,
    ) -> StoreResult<Vec<StockInfo>>;

    /// Insert-or-top-up a stock row; emits a `purchase` movement when
    /// `quantity > 0`.
    async fn seed_stock(
        &self,
        sku_id: i64,
        warehouse_id: i64,
        quantity: i32,
        alert_threshold: i32,
        created_by: Option<&str>,
        now: i64,
    ) -> StoreResult<()>;

    /// Atomically move quantity from `available` to `reserved`.
    ///
    /// Single guarded update conditioned on `available >= quantity`; two
    /// callers racing on the last unit get exactly one success. The `sale`
    /// movement referencing the order commits in the same transaction.
    /// Returns false (no mutation, no movement) on insufficient stock.
    async fn reserve(
        &self,
        sku_id: i64,
        warehouse_id: i64,
        quantity: i32,
        order_id: i64,
        now: i64,
    ) -> StoreResult<bool>;

    /// Credit `available`, debit `reserved` (clamped at 0); `return` movement
    /// referencing the order.
    async fn release(
        &self,
        sku_id: i64,
        warehouse_id: i64,
        quantity: i32,
        order_id: i64,
        now: i64,
    ) -> StoreResult<()>;

    /// Debit `reserved` (clamped at 0); `available` untouched. No movement —
    /// the sale was already recorded at reservation time.
    async fn deduct(
        &self,
        sku_id: i64,
        warehouse_id: i64,
        quantity: i32,
        now: i64,
    ) -> StoreResult<()>;

    /// Correct `available` by `delta`, clamped at 0 on decrease; emits an
    /// `adjustment` movement carrying the applied delta. Returns the applied
    /// delta (may be smaller in magnitude than requested due to the clamp).
    async fn adjust(
        &self,
        sku_id: i64,
        warehouse_id: i64,
        delta: i32,
        reason: &str,
        created_by: Option<&str>,
        now: i64,
    ) -> StoreResult<i32>;

    /// Move `available` quantity between warehouses. Guarded at the source
    /// (false on insufficiency); creates the destination row when missing;
    /// emits two `transfer` movements with opposite signs.
    async fn transfer(
        &self,
        sku_id: i64,
        from_warehouse_id: i64,
        to_warehouse_id: i64,
        quantity: i32,
        reason: &str,
        created_by: Option<&str>,
        now: i64,
    ) -> StoreResult<bool>;

    /// Movement history for a SKU, newest first
    async fn movements(
        &self,
        sku_id: i64,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<StockMovement>>;

    /// Rows at or below their alert threshold
    async fn low_stock(&self, warehouse_id: Option<i64>) -> StoreResult<Vec<StockInfo>>;
}

/// Orders, item snapshots and the tracking timeline
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist order + items + the creation tracking row in one transaction
    async fn create_order(
        &self,
        order: &Order,
        items: &[OrderItem],
        tracking: &OrderTracking,
    ) -> StoreResult<()>;

    async fn get_order(&self, id: i64) -> StoreResult<Option<Order>>;
    async fn order_items(&self, order_id: i64) -> StoreResult<Vec<OrderItem>>;
    async fn order_tracking(&self, order_id: i64) -> StoreResult<Vec<OrderTracking>>;

    /// Guarded status transition: persists `to`, stamps the milestone
    /// timestamp and appends the tracking row only when the current status
    /// still equals `from`. Returns false when the order moved concurrently —
    /// the transition did not happen and nothing was written.
    async fn update_status(
        &self,
        order_id: i64,
        from: OrderStatus,
        to: OrderStatus,
        now: i64,
        tracking: &OrderTracking,
    ) -> StoreResult<bool>;
}

/// Webhook events and payment records
#[async_trait]
pub trait WebhookStore: Send + Sync {
    /// Insert an accepted event. Returns false when the hash already exists;
    /// the unique constraint resolves concurrent duplicate inserts, and the
    /// losing request treats the event as already processed.
    async fn insert_event(&self, event: &WebhookEvent) -> StoreResult<bool>;
    async fn get_event(&self, event_hash: &str) -> StoreResult<Option<WebhookEvent>>;
    async fn mark_event_processed(&self, event_hash: &str, now: i64) -> StoreResult<()>;

    async fn upsert_payment(&self, payment: &Payment) -> StoreResult<()>;
    async fn get_payment(&self, payment_id: &str) -> StoreResult<Option<Payment>>;
}

/// The full storage surface, as injected into components
pub trait Store: CatalogStore + StockStore + OrderStore + WebhookStore {}

impl<T: CatalogStore + StockStore + OrderStore + WebhookStore> Store for T {}
