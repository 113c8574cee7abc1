use std::sync::Arc;

use thiserror::Error;

use shared::models::stock::{
    StockAdjustRequest, StockInfo, StockLevel, StockMovement, StockTransferRequest,
};
use shared::util::now_millis;

use crate::db::{StockStore, Store, StoreError};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("quantity must be positive")]
    InvalidQuantity,

    #[error("transfer source and destination must differ")]
    SameWarehouse,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Stock ledger service
///
/// `warehouse_id: None` means the default warehouse for mutations, and
/// "all warehouses" for reads (`check_stock`, `stock_level`, `low_stock`).
#[derive(Clone)]
pub struct StockLedger {
    store: Arc<dyn Store>,
    default_warehouse_id: i64,
}

impl StockLedger {
    pub fn new(store: Arc<dyn Store>, default_warehouse_id: i64) -> Self {
        Self {
            store,
            default_warehouse_id,
        }
    }

    pub fn default_warehouse_id(&self) -> i64 {
        self.default_warehouse_id
    }

    fn resolve(&self, warehouse_id: Option<i64>) -> i64 {
        warehouse_id.unwrap_or(self.default_warehouse_id)
    }

    /// Read-only availability check. Callers must not rely on it across
    /// requests — `reserve` re-checks atomically.
    pub async fn check_stock(
        &self,
        sku_id: i64,
        quantity: i32,
        warehouse_id: Option<i64>,
    ) -> Result<bool, LedgerError> {
        if quantity <= 0 {
            return Err(LedgerError::InvalidQuantity);
        }
        let rows = self.store.stock_rows(sku_id, warehouse_id).await?;
        let available: i64 = rows.iter().map(|r| r.available as i64).sum();
        Ok(available >= quantity as i64)
    }

    /// Move quantity from `available` to `reserved` for an order.
    /// Returns false on insufficient stock; nothing is written in that case.
    pub async fn reserve(
        &self,
        sku_id: i64,
        quantity: i32,
        order_id: i64,
        warehouse_id: Option<i64>,
    ) -> Result<bool, LedgerError> {
        if quantity <= 0 {
            return Err(LedgerError::InvalidQuantity);
        }
        let warehouse_id = self.resolve(warehouse_id);
        let reserved = self
            .store
            .reserve(sku_id, warehouse_id, quantity, order_id, now_millis())
            .await?;
        if reserved {
            tracing::debug!(sku_id, warehouse_id, quantity, order_id, "stock reserved");
        } else {
            tracing::info!(
                sku_id,
                warehouse_id,
                quantity,
                order_id,
                "reserve refused, insufficient stock"
            );
        }
        Ok(reserved)
    }

    /// Return reserved quantity to the sellable pool (order cancelled)
    pub async fn release(
        &self,
        sku_id: i64,
        quantity: i32,
        order_id: i64,
        warehouse_id: Option<i64>,
    ) -> Result<(), LedgerError> {
        if quantity <= 0 {
            return Err(LedgerError::InvalidQuantity);
        }
        let warehouse_id = self.resolve(warehouse_id);
        self.store
            .release(sku_id, warehouse_id, quantity, order_id, now_millis())
            .await?;
        tracing::debug!(sku_id, warehouse_id, quantity, order_id, "stock released");
        Ok(())
    }

    /// Remove reserved quantity permanently (payment confirmed).
    /// `available` is untouched — the units have left the system.
    pub async fn deduct(
        &self,
        sku_id: i64,
        quantity: i32,
        warehouse_id: Option<i64>,
    ) -> Result<(), LedgerError> {
        if quantity <= 0 {
            return Err(LedgerError::InvalidQuantity);
        }
        let warehouse_id = self.resolve(warehouse_id);
        self.store
            .deduct(sku_id, warehouse_id, quantity, now_millis())
            .await?;
        tracing::debug!(sku_id, warehouse_id, quantity, "stock deducted");
        Ok(())
    }

    /// Manual correction to `available` (receiving stock, write-offs).
    /// Returns the applied delta, which the clamp at 0 may shrink.
    pub async fn adjust(&self, req: &StockAdjustRequest) -> Result<i32, LedgerError> {
        if req.delta == 0 {
            return Ok(0);
        }
        let warehouse_id = self.resolve(req.warehouse_id);
        let applied = self
            .store
            .adjust(
                req.sku_id,
                warehouse_id,
                req.delta,
                &req.reason,
                req.created_by.as_deref(),
                now_millis(),
            )
            .await?;
        tracing::info!(
            sku_id = req.sku_id,
            warehouse_id,
            requested = req.delta,
            applied,
            reason = %req.reason,
            "stock adjusted"
        );
        Ok(applied)
    }

    /// Move available quantity between warehouses.
    /// Returns false when the source has insufficient stock.
    pub async fn transfer(&self, req: &StockTransferRequest) -> Result<bool, LedgerError> {
        if req.quantity <= 0 {
            return Err(LedgerError::InvalidQuantity);
        }
        if req.from_warehouse_id == req.to_warehouse_id {
            return Err(LedgerError::SameWarehouse);
        }
        let moved = self
            .store
            .transfer(
                req.sku_id,
                req.from_warehouse_id,
                req.to_warehouse_id,
                req.quantity,
                &req.reason,
                req.created_by.as_deref(),
                now_millis(),
            )
            .await?;
        if moved {
            tracing::info!(
                sku_id = req.sku_id,
                from = req.from_warehouse_id,
                to = req.to_warehouse_id,
                quantity = req.quantity,
                "stock transferred"
            );
        }
        Ok(moved)
    }

    /// Aggregated counters for a SKU; `None` when no stock row exists
    pub async fn stock_level(
        &self,
        sku_id: i64,
        warehouse_id: Option<i64>,
    ) -> Result<Option<StockLevel>, LedgerError> {
        let rows = self.store.stock_rows(sku_id, warehouse_id).await?;
        if rows.is_empty() {
            return Ok(None);
        }
        let available: i32 = rows.iter().map(|r| r.available).sum();
        let reserved: i32 = rows.iter().map(|r| r.reserved).sum();
        // Aggregated view reports the most conservative threshold
        let alert_threshold = rows.iter().map(|r| r.alert_threshold).max().unwrap_or(0);
        Ok(Some(StockLevel {
            available,
            reserved,
            total: available + reserved,
            alert_threshold,
        }))
    }

    /// Rows at or below their alert threshold (reporting projection)
    pub async fn low_stock(
        &self,
        warehouse_id: Option<i64>,
    ) -> Result<Vec<StockInfo>, LedgerError> {
        Ok(self.store.low_stock(warehouse_id).await?)
    }

    /// Movement history for a SKU, newest first (reporting projection)
    pub async fn movements(
        &self,
        sku_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StockMovement>, LedgerError> {
        Ok(self
            .store
            .movements(sku_id, limit.clamp(1, 200), offset.max(0))
            .await?)
    }
}
