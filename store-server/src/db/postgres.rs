//! PostgreSQL-backed store

use async_trait::async_trait;
use sqlx::PgPool;

use shared::models::order::{Order, OrderItem, OrderStatus, OrderTracking};
use shared::models::payment::{Payment, WebhookEvent};
use shared::models::sku::{Product, Sku};
use shared::models::stock::{StockInfo, StockMovement, Warehouse};

use super::{
    catalog, orders, stock, webhook, CatalogStore, OrderStore, StockStore, StoreResult,
    WebhookStore,
};

/// Store implementation over a PostgreSQL connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn create_product(&self, product: &Product) -> StoreResult<()> {
        catalog::create_product(&self.pool, product).await
    }

    async fn get_product(&self, id: i64) -> StoreResult<Option<Product>> {
        catalog::get_product(&self.pool, id).await
    }

    async fn create_sku(&self, sku: &Sku) -> StoreResult<()> {
        catalog::create_sku(&self.pool, sku).await
    }

    async fn get_sku(&self, id: i64) -> StoreResult<Option<Sku>> {
        catalog::get_sku(&self.pool, id).await
    }

    async fn skus_for_product(&self, product_id: i64) -> StoreResult<Vec<Sku>> {
        catalog::skus_for_product(&self.pool, product_id).await
    }

    async fn deactivate_sku(&self, id: i64) -> StoreResult<bool> {
        catalog::deactivate_sku(&self.pool, id).await
    }
}

#[async_trait]
impl StockStore for PgStore {
    async fn create_warehouse(&self, warehouse: &Warehouse) -> StoreResult<()> {
        stock::create_warehouse(&self.pool, warehouse).await
    }

    async fn get_warehouse(&self, id: i64) -> StoreResult<Option<Warehouse>> {
        stock::get_warehouse(&self.pool, id).await
    }

    async fn stock_rows(
        &self,
        sku_id: i64,
        warehouse_id: Option<i64>,
    ) -> StoreResult<Vec<StockInfo>> {
        stock::stock_rows(&self.pool, sku_id, warehouse_id).await
    }

    async fn seed_stock(
        &self,
        sku_id: i64,
        warehouse_id: i64,
        quantity: i32,
        alert_threshold: i32,
        created_by: Option<&str>,
        now: i64,
    ) -> StoreResult<()> {
        stock::seed_stock(
            &self.pool,
            sku_id,
            warehouse_id,
            quantity,
            alert_threshold,
            created_by,
            now,
        )
        .await
    }

    async fn reserve(
        &self,
        sku_id: i64,
        warehouse_id: i64,
        quantity: i32,
        order_id: i64,
        now: i64,
    ) -> StoreResult<bool> {
        stock::reserve(&self.pool, sku_id, warehouse_id, quantity, order_id, now).await
    }

    async fn release(
        &self,
        sku_id: i64,
        warehouse_id: i64,
        quantity: i32,
        order_id: i64,
        now: i64,
    ) -> StoreResult<()> {
        stock::release(&self.pool, sku_id, warehouse_id, quantity, order_id, now).await
    }

    async fn deduct(
        &self,
        sku_id: i64,
        warehouse_id: i64,
        quantity: i32,
        _now: i64,
    ) -> StoreResult<()> {
        stock::deduct(&self.pool, sku_id, warehouse_id, quantity).await
    }

    async fn adjust(
        &self,
        sku_id: i64,
        warehouse_id: i64,
        delta: i32,
        reason: &str,
        created_by: Option<&str>,
        now: i64,
    ) -> StoreResult<i32> {
        stock::adjust(&self.pool, sku_id, warehouse_id, delta, reason, created_by, now).await
    }

    async fn transfer(
        &self,
        sku_id: i64,
        from_warehouse_id: i64,
        to_warehouse_id: i64,
        quantity: i32,
        reason: &str,
        created_by: Option<&str>,
        now: i64,
    ) -> StoreResult<bool> {
        stock::transfer(
            &self.pool,
            sku_id,
            from_warehouse_id,
            to_warehouse_id,
            quantity,
            reason,
            created_by,
            now,
        )
        .await
    }

    async fn movements(
        &self,
        sku_id: i64,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<StockMovement>> {
        stock::movements(&self.pool, sku_id, limit, offset).await
    }

    async fn low_stock(&self, warehouse_id: Option<i64>) -> StoreResult<Vec<StockInfo>> {
        stock::low_stock(&self.pool, warehouse_id).await
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn create_order(
        &self,
        order: &Order,
        items: &[OrderItem],
        tracking: &OrderTracking,
    ) -> StoreResult<()> {
        orders::create_order(&self.pool, order, items, tracking).await
    }

    async fn get_order(&self, id: i64) -> StoreResult<Option<Order>> {
        orders::get_order(&self.pool, id).await
    }

    async fn order_items(&self, order_id: i64) -> StoreResult<Vec<OrderItem>> {
        orders::order_items(&self.pool, order_id).await
    }

    async fn order_tracking(&self, order_id: i64) -> StoreResult<Vec<OrderTracking>> {
        orders::order_tracking(&self.pool, order_id).await
    }

    async fn update_status(
        &self,
        order_id: i64,
        from: OrderStatus,
        to: OrderStatus,
        now: i64,
        tracking: &OrderTracking,
    ) -> StoreResult<bool> {
        orders::update_status(&self.pool, order_id, from, to, now, tracking).await
    }
}

#[async_trait]
impl WebhookStore for PgStore {
    async fn insert_event(&self, event: &WebhookEvent) -> StoreResult<bool> {
        webhook::insert_event(&self.pool, event).await
    }

    async fn get_event(&self, event_hash: &str) -> StoreResult<Option<WebhookEvent>> {
        webhook::get_event(&self.pool, event_hash).await
    }

    async fn mark_event_processed(&self, event_hash: &str, now: i64) -> StoreResult<()> {
        webhook::mark_event_processed(&self.pool, event_hash, now).await
    }

    async fn upsert_payment(&self, payment: &Payment) -> StoreResult<()> {
        webhook::upsert_payment(&self.pool, payment).await
    }

    async fn get_payment(&self, payment_id: &str) -> StoreResult<Option<Payment>> {
        webhook::get_payment(&self.pool, payment_id).await
    }
}
