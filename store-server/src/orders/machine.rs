use std::sync::Arc;

use thiserror::Error;

use shared::models::order::{
    OrderStatus, OrderTracking, ReleaseOutcome, ShipRequest,
};
use shared::util::{now_millis, snowflake_id};

use crate::db::{OrderStore, Store, StoreError};
use crate::inventory::{LedgerError, StockLedger};

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("order {0} not found")]
    OrderNotFound(i64),

    #[error("transition {from} -> {to} not permitted")]
    NotPermitted { from: OrderStatus, to: OrderStatus },

    /// The guarded status update matched no row — the order was moved by a
    /// concurrent transition between our read and our write.
    #[error("order {0} changed concurrently")]
    Conflict(i64),

    #[error("stock deduction failed for sku {sku_id}: {source}")]
    Deduct {
        sku_id: i64,
        source: LedgerError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of an applied transition
#[derive(Debug)]
pub struct TransitionReport {
    pub order_id: i64,
    pub from: OrderStatus,
    pub to: OrderStatus,
    /// Per-item outcomes of the cancellation release batch; empty for
    /// every other edge
    pub releases: Vec<ReleaseOutcome>,
}

/// 订单状态固定描述模板
fn tracking_description(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "订单已创建，等待支付",
        OrderStatus::Paid => "支付已完成",
        OrderStatus::Shipped => "订单已发货",
        OrderStatus::Delivered => "订单已送达",
        OrderStatus::Cancelled => "订单已取消",
    }
}

/// Creation tracking row (used by checkout)
pub(crate) fn creation_tracking(order_id: i64, now: i64) -> OrderTracking {
    OrderTracking {
        id: snowflake_id(),
        order_id,
        status: OrderStatus::Pending,
        description: tracking_description(OrderStatus::Pending).to_string(),
        carrier: None,
        tracking_number: None,
        created_at: now,
    }
}

/// Order state machine
///
/// Owns every status change and the stock effects attached to the edges.
/// Webhook-driven and merchant-driven transitions both come through
/// [`transition`](Self::transition), so the permitted-successor check is the
/// single ordering guard for out-of-order or duplicated callers.
#[derive(Clone)]
pub struct OrderMachine {
    store: Arc<dyn Store>,
    ledger: StockLedger,
}

impl OrderMachine {
    pub fn new(store: Arc<dyn Store>, ledger: StockLedger) -> Self {
        Self { store, ledger }
    }

    pub async fn transition(
        &self,
        order_id: i64,
        to: OrderStatus,
        ship: Option<&ShipRequest>,
    ) -> Result<TransitionReport, TransitionError> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(TransitionError::OrderNotFound(order_id))?;
        let from = order.status;

        if !from.can_transition_to(to) {
            return Err(TransitionError::NotPermitted { from, to });
        }

        let now = now_millis();
        let mut tracking = OrderTracking {
            id: snowflake_id(),
            order_id,
            status: to,
            description: tracking_description(to).to_string(),
            carrier: None,
            tracking_number: None,
            created_at: now,
        };
        if let Some(ship) = ship
            && to == OrderStatus::Shipped
        {
            tracking.carrier = Some(ship.carrier.clone());
            tracking.tracking_number = Some(ship.tracking_number.clone());
        }

        let mut releases = Vec::new();
        match to {
            OrderStatus::Paid => {
                // Deduct before the status is persisted: the order must never
                // appear paid while stock was not actually deducted. Any item
                // failure aborts the whole transition.
                let items = self.store.order_items(order_id).await?;
                for item in &items {
                    if let Err(source) = self
                        .ledger
                        .deduct(item.sku_id, item.quantity, Some(item.warehouse_id))
                        .await
                    {
                        return Err(TransitionError::Deduct {
                            sku_id: item.sku_id,
                            source,
                        });
                    }
                }
                let won = self
                    .store
                    .update_status(order_id, from, to, now, &tracking)
                    .await?;
                if !won {
                    // Deductions already applied; the drift surfaces in the
                    // alerting view and needs manual reconciliation.
                    tracing::error!(
                        order_id,
                        "order changed concurrently after stock deduction"
                    );
                    return Err(TransitionError::Conflict(order_id));
                }
            }
            OrderStatus::Cancelled => {
                // Persist first: the terminal status can only be crossed once,
                // which is what keeps the release batch single-shot.
                let won = self
                    .store
                    .update_status(order_id, from, to, now, &tracking)
                    .await?;
                if !won {
                    return Err(TransitionError::Conflict(order_id));
                }
                // Best-effort: one item's failure must not block releasing
                // the others — the order is being abandoned regardless.
                let items = self.store.order_items(order_id).await?;
                let results = futures::future::join_all(items.iter().map(|item| {
                    self.ledger.release(
                        item.sku_id,
                        item.quantity,
                        order_id,
                        Some(item.warehouse_id),
                    )
                }))
                .await;
                for (item, result) in items.iter().zip(results) {
                    let error = result.err().map(|e| e.to_string());
                    if let Some(ref e) = error {
                        tracing::error!(
                            order_id,
                            sku_id = item.sku_id,
                            error = %e,
                            "stock release failed during cancellation, needs reconciliation"
                        );
                    }
                    releases.push(ReleaseOutcome {
                        sku_id: item.sku_id,
                        warehouse_id: item.warehouse_id,
                        quantity: item.quantity,
                        released: error.is_none(),
                        error,
                    });
                }
            }
            OrderStatus::Shipped | OrderStatus::Delivered => {
                let won = self
                    .store
                    .update_status(order_id, from, to, now, &tracking)
                    .await?;
                if !won {
                    return Err(TransitionError::Conflict(order_id));
                }
            }
            OrderStatus::Pending => unreachable!("pending is never a transition target"),
        }

        tracing::info!(order_id, from = %from, to = %to, "order transitioned");
        Ok(TransitionReport {
            order_id,
            from,
            to,
            releases,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::db::OrderStore;
    use rust_decimal::Decimal;
    use shared::models::order::Order;

    fn pending_order(id: i64) -> Order {
        Order {
            id,
            status: OrderStatus::Pending,
            total_amount: Decimal::new(4998, 2),
            shipping_address: "测试地址".into(),
            created_at: 0,
            paid_at: None,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
        }
    }

    fn machine() -> (OrderMachine, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let ledger = StockLedger::new(store.clone(), 1);
        (OrderMachine::new(store.clone(), ledger), store)
    }

    #[tokio::test]
    async fn rejects_unknown_order() {
        let (machine, _) = machine();
        assert!(matches!(
            machine.transition(999, OrderStatus::Paid, None).await,
            Err(TransitionError::OrderNotFound(999))
        ));
    }

    #[tokio::test]
    async fn rejects_non_successor() {
        let (machine, store) = machine();
        let order = pending_order(1);
        store
            .create_order(&order, &[], &creation_tracking(1, 0))
            .await
            .unwrap();

        let err = machine
            .transition(1, OrderStatus::Delivered, None)
            .await
            .unwrap_err();
        assert!(matches!(err, TransitionError::NotPermitted { .. }));
    }

    #[tokio::test]
    async fn ship_tracking_carries_carrier() {
        let (machine, store) = machine();
        let mut order = pending_order(1);
        order.status = OrderStatus::Paid;
        store
            .create_order(&order, &[], &creation_tracking(1, 0))
            .await
            .unwrap();

        let ship = ShipRequest {
            carrier: "顺丰".into(),
            tracking_number: "SF123".into(),
        };
        machine
            .transition(1, OrderStatus::Shipped, Some(&ship))
            .await
            .unwrap();

        let tracking = store.order_tracking(1).await.unwrap();
        let last = tracking.last().unwrap();
        assert_eq!(last.status, OrderStatus::Shipped);
        assert_eq!(last.carrier.as_deref(), Some("顺丰"));
        assert_eq!(last.tracking_number.as_deref(), Some("SF123"));
        assert_eq!(last.description, "订单已发货");
    }
}
