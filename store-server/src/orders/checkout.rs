use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;

use shared::models::order::{
    CheckoutRequest, Order, OrderDetail, OrderItem, OrderStatus,
};
use shared::models::sku::{Product, Sku};
use shared::util::{now_millis, snowflake_id};

use crate::catalog::SkuResolver;
use crate::db::{CatalogStore, OrderStore, Store, StoreError};
use crate::inventory::{LedgerError, StockLedger};

use super::machine::creation_tracking;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("checkout contains no lines")]
    Empty,

    #[error("invalid quantity for product {0}")]
    InvalidQuantity(i64),

    #[error("product {0} not found")]
    ProductNotFound(i64),

    /// No active SKU matches the selection — a catalog miss, not a stock-out
    #[error("product {0} has no sellable variant for the selected attributes")]
    NotSellable(i64),

    /// The specific failing line, so the storefront can point at it
    #[error("insufficient stock for {sku_code}")]
    OutOfStock { sku_id: i64, sku_code: String },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Checkout: variant resolution + all-or-nothing reservation + order creation
#[derive(Clone)]
pub struct CheckoutService {
    store: Arc<dyn Store>,
    resolver: SkuResolver,
    ledger: StockLedger,
}

impl CheckoutService {
    pub fn new(store: Arc<dyn Store>, resolver: SkuResolver, ledger: StockLedger) -> Self {
        Self {
            store,
            resolver,
            ledger,
        }
    }

    /// Create an order in `pending`.
    ///
    /// Reservation is all-or-nothing: when a later line fails, every
    /// already-reserved line is released again and the checkout aborts with
    /// the failing line, so no partial order is ever left behind.
    pub async fn create_order(&self, req: CheckoutRequest) -> Result<OrderDetail, CheckoutError> {
        if req.lines.is_empty() {
            return Err(CheckoutError::Empty);
        }
        for line in &req.lines {
            if line.quantity <= 0 {
                return Err(CheckoutError::InvalidQuantity(line.product_id));
            }
        }

        // Resolve every line before touching the ledger
        let mut resolved: Vec<(Product, Sku, i32)> = Vec::with_capacity(req.lines.len());
        for line in &req.lines {
            let sku = self
                .resolver
                .resolve(line.product_id, &line.attributes)
                .await?
                .ok_or(CheckoutError::NotSellable(line.product_id))?;
            let product = self
                .store
                .get_product(line.product_id)
                .await?
                .ok_or(CheckoutError::ProductNotFound(line.product_id))?;
            resolved.push((product, sku, line.quantity));
        }

        let order_id = snowflake_id();
        let warehouse_id = self.ledger.default_warehouse_id();

        // Reserve line by line; on failure, put back what we already took
        let mut reserved: Vec<(i64, i32)> = Vec::new();
        for (_, sku, quantity) in &resolved {
            let ok = self
                .ledger
                .reserve(sku.id, *quantity, order_id, Some(warehouse_id))
                .await;
            match ok {
                Ok(true) => reserved.push((sku.id, *quantity)),
                Ok(false) => {
                    self.rollback(order_id, warehouse_id, &reserved).await;
                    return Err(CheckoutError::OutOfStock {
                        sku_id: sku.id,
                        sku_code: sku.sku_code.clone(),
                    });
                }
                Err(e) => {
                    self.rollback(order_id, warehouse_id, &reserved).await;
                    return Err(e.into());
                }
            }
        }

        let now = now_millis();
        let mut items = Vec::with_capacity(resolved.len());
        let mut total = Decimal::ZERO;
        for (product, sku, quantity) in &resolved {
            total += sku.price * Decimal::from(*quantity);
            items.push(OrderItem {
                id: snowflake_id(),
                order_id,
                sku_id: sku.id,
                warehouse_id,
                product_name: product.name.clone(),
                product_image: product.image.clone(),
                unit_price: sku.price,
                quantity: *quantity,
                size: sku.attribute("size").map(str::to_string),
                color: sku.attribute("color").map(str::to_string),
            });
        }

        let order = Order {
            id: order_id,
            status: OrderStatus::Pending,
            total_amount: total,
            shipping_address: req.shipping_address,
            created_at: now,
            paid_at: None,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
        };
        let tracking = creation_tracking(order_id, now);

        if let Err(e) = self.store.create_order(&order, &items, &tracking).await {
            // Order row failed after the reservations went through
            self.rollback(order_id, warehouse_id, &reserved).await;
            return Err(e.into());
        }

        tracing::info!(
            order_id,
            lines = items.len(),
            total = %order.total_amount,
            "order created"
        );
        Ok(OrderDetail {
            order,
            items,
            tracking: vec![tracking],
        })
    }

    /// Release reservations taken for an aborted checkout. Failures are
    /// logged and skipped — the abort itself must not get stuck.
    async fn rollback(&self, order_id: i64, warehouse_id: i64, reserved: &[(i64, i32)]) {
        for (sku_id, quantity) in reserved {
            if let Err(e) = self
                .ledger
                .release(*sku_id, *quantity, order_id, Some(warehouse_id))
                .await
            {
                tracing::error!(
                    order_id,
                    sku_id,
                    error = %e,
                    "failed to roll back reservation for aborted checkout"
                );
            }
        }
    }
}
