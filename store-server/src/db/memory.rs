//! In-process storage fake
//!
//! Implements the full [`Store`](super::Store) surface over plain maps behind
//! a single mutex, so every operation is atomic exactly like its SQL
//! counterpart. Used by the test suites and by local development without a
//! database.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use shared::models::order::{Order, OrderItem, OrderStatus, OrderTracking};
use shared::models::payment::{Payment, WebhookEvent};
use shared::models::sku::{Product, Sku};
use shared::models::stock::{MovementType, StockInfo, StockMovement, Warehouse};
use shared::util::snowflake_id;

use super::{
    CatalogStore, OrderStore, StockStore, StoreError, StoreResult, WebhookStore,
};

#[derive(Default)]
struct Inner {
    products: HashMap<i64, Product>,
    skus: HashMap<i64, Sku>,
    warehouses: HashMap<i64, Warehouse>,
    /// Keyed by (sku_id, warehouse_id)
    stock: HashMap<(i64, i64), StockInfo>,
    movements: Vec<StockMovement>,
    orders: HashMap<i64, Order>,
    order_items: HashMap<i64, Vec<OrderItem>>,
    order_tracking: HashMap<i64, Vec<OrderTracking>>,
    /// Keyed by event hash
    events: HashMap<String, WebhookEvent>,
    payments: HashMap<String, Payment>,
}

/// In-memory store; cheap to clone, all clones share state
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total movement rows recorded (test helper)
    pub fn movement_count(&self) -> usize {
        self.inner.lock().movements.len()
    }

    /// Movement rows for one SKU, oldest first (test helper)
    pub fn movements_for(&self, sku_id: i64) -> Vec<StockMovement> {
        self.inner
            .lock()
            .movements
            .iter()
            .filter(|m| m.sku_id == sku_id)
            .cloned()
            .collect()
    }

    fn push_movement(
        inner: &mut Inner,
        sku_id: i64,
        warehouse_id: i64,
        quantity: i32,
        movement_type: MovementType,
        reference_id: Option<i64>,
        reason: Option<String>,
        created_by: Option<&str>,
        now: i64,
    ) {
        inner.movements.push(StockMovement {
            id: snowflake_id(),
            sku_id,
            warehouse_id,
            quantity,
            movement_type,
            reference_id,
            reason,
            created_by: created_by.map(str::to_string),
            created_at: now,
        });
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn create_product(&self, product: &Product) -> StoreResult<()> {
        self.inner.lock().products.insert(product.id, product.clone());
        Ok(())
    }

    async fn get_product(&self, id: i64) -> StoreResult<Option<Product>> {
        Ok(self.inner.lock().products.get(&id).cloned())
    }

    async fn create_sku(&self, sku: &Sku) -> StoreResult<()> {
        self.inner.lock().skus.insert(sku.id, sku.clone());
        Ok(())
    }

    async fn get_sku(&self, id: i64) -> StoreResult<Option<Sku>> {
        Ok(self.inner.lock().skus.get(&id).cloned())
    }

    async fn skus_for_product(&self, product_id: i64) -> StoreResult<Vec<Sku>> {
        let inner = self.inner.lock();
        let mut skus: Vec<Sku> = inner
            .skus
            .values()
            .filter(|s| s.product_id == product_id)
            .cloned()
            .collect();
        skus.sort_by_key(|s| s.id);
        Ok(skus)
    }

    async fn deactivate_sku(&self, id: i64) -> StoreResult<bool> {
        let mut inner = self.inner.lock();
        match inner.skus.get_mut(&id) {
            Some(sku) => {
                sku.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl StockStore for MemoryStore {
    async fn create_warehouse(&self, warehouse: &Warehouse) -> StoreResult<()> {
        self.inner
            .lock()
            .warehouses
            .insert(warehouse.id, warehouse.clone());
        Ok(())
    }

    async fn get_warehouse(&self, id: i64) -> StoreResult<Option<Warehouse>> {
        Ok(self.inner.lock().warehouses.get(&id).cloned())
    }

    async fn stock_rows(
        &self,
        sku_id: i64,
        warehouse_id: Option<i64>,
    ) -> StoreResult<Vec<StockInfo>> {
        let inner = self.inner.lock();
        let mut rows: Vec<StockInfo> = inner
            .stock
            .values()
            .filter(|r| r.sku_id == sku_id && warehouse_id.is_none_or(|w| r.warehouse_id == w))
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.warehouse_id);
        Ok(rows)
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
        let mut inner = self.inner.lock();
        let row = inner
            .stock
            .entry((sku_id, warehouse_id))
            .or_insert_with(|| StockInfo {
                sku_id,
                warehouse_id,
                available: 0,
                reserved: 0,
                alert_threshold,
            });
        row.available += quantity;
        row.alert_threshold = alert_threshold;
        if quantity > 0 {
            Self::push_movement(
                &mut inner,
                sku_id,
                warehouse_id,
                quantity,
                MovementType::Purchase,
                None,
                Some("stock received".to_string()),
                created_by,
                now,
            );
        }
        Ok(())
    }

    async fn reserve(
        &self,
        sku_id: i64,
        warehouse_id: i64,
        quantity: i32,
        order_id: i64,
        now: i64,
    ) -> StoreResult<bool> {
        let mut inner = self.inner.lock();
        let Some(row) = inner.stock.get_mut(&(sku_id, warehouse_id)) else {
            return Ok(false);
        };
        // Guarded update: the check and the move are atomic under the lock
        if row.available < quantity {
            return Ok(false);
        }
        row.available -= quantity;
        row.reserved += quantity;
        Self::push_movement(
            &mut inner,
            sku_id,
            warehouse_id,
            -quantity,
            MovementType::Sale,
            Some(order_id),
            None,
            None,
            now,
        );
        Ok(true)
    }

    async fn release(
        &self,
        sku_id: i64,
        warehouse_id: i64,
        quantity: i32,
        order_id: i64,
        now: i64,
    ) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        let Some(row) = inner.stock.get_mut(&(sku_id, warehouse_id)) else {
            return Err(StoreError::Integrity(format!(
                "no stock row for sku {sku_id} at warehouse {warehouse_id}"
            )));
        };
        row.available += quantity;
        row.reserved = (row.reserved - quantity).max(0);
        Self::push_movement(
            &mut inner,
            sku_id,
            warehouse_id,
            quantity,
            MovementType::Return,
            Some(order_id),
            None,
            None,
            now,
        );
        Ok(())
    }

    async fn deduct(
        &self,
        sku_id: i64,
        warehouse_id: i64,
        quantity: i32,
        _now: i64,
    ) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        let Some(row) = inner.stock.get_mut(&(sku_id, warehouse_id)) else {
            return Err(StoreError::Integrity(format!(
                "no stock row for sku {sku_id} at warehouse {warehouse_id}"
            )));
        };
        row.reserved = (row.reserved - quantity).max(0);
        Ok(())
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
        let mut inner = self.inner.lock();
        let Some(row) = inner.stock.get_mut(&(sku_id, warehouse_id)) else {
            return Err(StoreError::Integrity(format!(
                "no stock row for sku {sku_id} at warehouse {warehouse_id}"
            )));
        };
        let before = row.available;
        row.available = (row.available + delta).max(0);
        let applied = row.available - before;
        if applied != 0 {
            Self::push_movement(
                &mut inner,
                sku_id,
                warehouse_id,
                applied,
                MovementType::Adjustment,
                None,
                Some(reason.to_string()),
                created_by,
                now,
            );
        }
        Ok(applied)
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
        let mut inner = self.inner.lock();
        let Some(src) = inner.stock.get_mut(&(sku_id, from_warehouse_id)) else {
            return Ok(false);
        };
        if src.available < quantity {
            return Ok(false);
        }
        src.available -= quantity;
        let threshold = src.alert_threshold;
        let dst = inner
            .stock
            .entry((sku_id, to_warehouse_id))
            .or_insert_with(|| StockInfo {
                sku_id,
                warehouse_id: to_warehouse_id,
                available: 0,
                reserved: 0,
                alert_threshold: threshold,
            });
        dst.available += quantity;
        Self::push_movement(
            &mut inner,
            sku_id,
            from_warehouse_id,
            -quantity,
            MovementType::Transfer,
            None,
            Some(format!("{reason} (to warehouse {to_warehouse_id})")),
            created_by,
            now,
        );
        Self::push_movement(
            &mut inner,
            sku_id,
            to_warehouse_id,
            quantity,
            MovementType::Transfer,
            None,
            Some(format!("{reason} (from warehouse {from_warehouse_id})")),
            created_by,
            now,
        );
        Ok(true)
    }

    async fn movements(
        &self,
        sku_id: i64,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<StockMovement>> {
        let inner = self.inner.lock();
        let mut rows: Vec<StockMovement> = inner
            .movements
            .iter()
            .filter(|m| m.sku_id == sku_id)
            .cloned()
            .collect();
        rows.reverse(); // newest first
        Ok(rows
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn low_stock(&self, warehouse_id: Option<i64>) -> StoreResult<Vec<StockInfo>> {
        let inner = self.inner.lock();
        let mut rows: Vec<StockInfo> = inner
            .stock
            .values()
            .filter(|r| {
                warehouse_id.is_none_or(|w| r.warehouse_id == w)
                    && r.available <= r.alert_threshold
            })
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.sku_id, r.warehouse_id));
        Ok(rows)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order(
        &self,
        order: &Order,
        items: &[OrderItem],
        tracking: &OrderTracking,
    ) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        inner.orders.insert(order.id, order.clone());
        inner.order_items.insert(order.id, items.to_vec());
        inner
            .order_tracking
            .insert(order.id, vec![tracking.clone()]);
        Ok(())
    }

    async fn get_order(&self, id: i64) -> StoreResult<Option<Order>> {
        Ok(self.inner.lock().orders.get(&id).cloned())
    }

    async fn order_items(&self, order_id: i64) -> StoreResult<Vec<OrderItem>> {
        Ok(self
            .inner
            .lock()
            .order_items
            .get(&order_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn order_tracking(&self, order_id: i64) -> StoreResult<Vec<OrderTracking>> {
        Ok(self
            .inner
            .lock()
            .order_tracking
            .get(&order_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_status(
        &self,
        order_id: i64,
        from: OrderStatus,
        to: OrderStatus,
        now: i64,
        tracking: &OrderTracking,
    ) -> StoreResult<bool> {
        let mut inner = self.inner.lock();
        let Some(order) = inner.orders.get_mut(&order_id) else {
            return Ok(false);
        };
        // Guarded: only the caller that still sees `from` wins
        if order.status != from {
            return Ok(false);
        }
        order.status = to;
        match to {
            OrderStatus::Paid => order.paid_at = Some(now),
            OrderStatus::Shipped => order.shipped_at = Some(now),
            OrderStatus::Delivered => order.delivered_at = Some(now),
            OrderStatus::Cancelled => order.cancelled_at = Some(now),
            OrderStatus::Pending => {}
        }
        inner
            .order_tracking
            .entry(order_id)
            .or_default()
            .push(tracking.clone());
        Ok(true)
    }
}

#[async_trait]
impl WebhookStore for MemoryStore {
    async fn insert_event(&self, event: &WebhookEvent) -> StoreResult<bool> {
        let mut inner = self.inner.lock();
        if inner.events.contains_key(&event.event_hash) {
            return Ok(false);
        }
        inner.events.insert(event.event_hash.clone(), event.clone());
        Ok(true)
    }

    async fn get_event(&self, event_hash: &str) -> StoreResult<Option<WebhookEvent>> {
        Ok(self.inner.lock().events.get(event_hash).cloned())
    }

    async fn mark_event_processed(&self, event_hash: &str, now: i64) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        match inner.events.get_mut(event_hash) {
            Some(event) => {
                event.processed_at = Some(now);
                Ok(())
            }
            None => Err(StoreError::Integrity(format!(
                "webhook event {event_hash} not recorded"
            ))),
        }
    }

    async fn upsert_payment(&self, payment: &Payment) -> StoreResult<()> {
        self.inner
            .lock()
            .payments
            .insert(payment.payment_id.clone(), payment.clone());
        Ok(())
    }

    async fn get_payment(&self, payment_id: &str) -> StoreResult<Option<Payment>> {
        Ok(self.inner.lock().payments.get(payment_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(store: &MemoryStore, sku_id: i64, warehouse_id: i64, qty: i32) {
        let mut inner = store.inner.lock();
        inner.stock.insert(
            (sku_id, warehouse_id),
            StockInfo {
                sku_id,
                warehouse_id,
                available: qty,
                reserved: 0,
                alert_threshold: 5,
            },
        );
    }

    #[tokio::test]
    async fn reserve_is_guarded() {
        let store = MemoryStore::new();
        seed(&store, 1, 1, 3);

        assert!(store.reserve(1, 1, 2, 100, 0).await.unwrap());
        assert!(!store.reserve(1, 1, 2, 101, 0).await.unwrap());

        let rows = store.stock_rows(1, Some(1)).await.unwrap();
        assert_eq!(rows[0].available, 1);
        assert_eq!(rows[0].reserved, 2);
        // Failed reserve leaves no movement behind
        assert_eq!(store.movement_count(), 1);
    }

    #[tokio::test]
    async fn adjust_clamps_at_zero() {
        let store = MemoryStore::new();
        seed(&store, 1, 1, 3);

        let applied = store.adjust(1, 1, -10, "write-off", None, 0).await.unwrap();
        assert_eq!(applied, -3);
        let rows = store.stock_rows(1, Some(1)).await.unwrap();
        assert_eq!(rows[0].available, 0);

        let movements = store.movements_for(1);
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].quantity, -3);
    }

    #[tokio::test]
    async fn transfer_creates_destination_row() {
        let store = MemoryStore::new();
        seed(&store, 1, 1, 4);

        assert!(store.transfer(1, 1, 2, 3, "rebalance", None, 0).await.unwrap());
        let rows = store.stock_rows(1, None).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].available, 1);
        assert_eq!(rows[1].available, 3);
        assert_eq!(store.movement_count(), 2);

        // Insufficient source is refused without movement rows
        assert!(!store.transfer(1, 1, 2, 5, "rebalance", None, 0).await.unwrap());
        assert_eq!(store.movement_count(), 2);
    }

    #[tokio::test]
    async fn duplicate_event_insert_is_refused() {
        let store = MemoryStore::new();
        let event = WebhookEvent {
            id: 1,
            event_hash: "abc".into(),
            payment_id: "p1".into(),
            order_id: None,
            raw_payload: "{}".into(),
            received_at: 0,
            processed_at: None,
        };
        assert!(store.insert_event(&event).await.unwrap());
        assert!(!store.insert_event(&event).await.unwrap());
    }
}
