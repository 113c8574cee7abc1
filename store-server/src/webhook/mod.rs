//! Webhook ingestion gate
//!
//! Stateless verifier in front of the order state machine. Every delivery
//! runs the same four-stage pipeline; each stage is an independent
//! function, composed here and exposed to the transport layer as
//! [`WebhookGate::process`].
//!
//! ```text
//! process(raw body, signature header)
//!     ├─ 1. verify HMAC-SHA512 over the raw body (before any parsing)
//!     ├─ 2. dedup: SHA-256 content hash, INSERT-first into webhook_events
//!     ├─ 3. map provider payment vocabulary to the domain status set
//!     └─ 4. terminal status + order id → order state machine transition;
//!           non-terminal → payment record update only
//! ```
//!
//! The gateway retries on non-2xx and may deliver out of order. Dedup makes
//! each distinct body apply at most once; the state machine's
//! permitted-transition check is the ordering guard for distinct bodies
//! arriving late (a stale "cancelled" after delivery is simply rejected).

mod signature;
mod status;

pub use signature::{content_hash, sign, verify_signature, SignatureError};
pub use status::map_provider_status;

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;

use shared::models::order::OrderStatus;
use shared::models::payment::{Payment, PaymentStatus, WebhookAck, WebhookEvent};
use shared::util::{now_millis, snowflake_id};

use crate::db::{Store, StoreError, WebhookStore};
use crate::notify::Notifier;
use crate::orders::{OrderMachine, TransitionError};

#[derive(Debug, Error)]
pub enum WebhookError {
    /// 401 — rejected before parsing, no event recorded
    #[error("signature rejected: {0}")]
    Signature(#[from] SignatureError),

    /// 400 — body is not JSON or misses required fields
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// 400 — provider status not in the mapping table (event stays recorded)
    #[error("unknown provider payment status: {0}")]
    UnknownStatus(String),

    /// 500 — storage failed; the gateway retry will re-run the pipeline
    #[error(transparent)]
    Store(#[from] StoreError),

    /// 502 — core update committed, downstream notification failed
    #[error("notification failed after commit: {0}")]
    Notify(String),
}

/// Fields consumed from the gateway payload
struct GatewayEvent {
    payment_id: String,
    order_id: Option<i64>,
    payment_status: String,
    actually_paid: Decimal,
}

fn parse_event(body: &[u8]) -> Result<GatewayEvent, WebhookError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| WebhookError::Malformed(e.to_string()))?;

    // payment_id arrives as string or number depending on the gateway version
    let payment_id = match &value["payment_id"] {
        serde_json::Value::String(s) if !s.is_empty() => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return Err(WebhookError::Malformed("missing payment_id".into())),
    };
    let order_id = match &value["order_id"] {
        serde_json::Value::String(s) => s.parse::<i64>().ok(),
        serde_json::Value::Number(n) => n.as_i64(),
        _ => None,
    };
    let payment_status = value["payment_status"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| WebhookError::Malformed("missing payment_status".into()))?;
    let actually_paid = value["actually_paid"]
        .as_f64()
        .and_then(|f| Decimal::try_from(f).ok())
        .unwrap_or(Decimal::ZERO);

    Ok(GatewayEvent {
        payment_id,
        order_id,
        payment_status,
        actually_paid,
    })
}

/// Webhook ingestion gate
pub struct WebhookGate {
    store: Arc<dyn Store>,
    machine: OrderMachine,
    notifier: Arc<dyn Notifier>,
    secret: String,
}

impl WebhookGate {
    pub fn new(
        store: Arc<dyn Store>,
        machine: OrderMachine,
        notifier: Arc<dyn Notifier>,
        secret: String,
    ) -> Self {
        Self {
            store,
            machine,
            notifier,
            secret,
        }
    }

    /// Run one delivery through the pipeline.
    ///
    /// Exactly-once to the domain: the first successful run of a given body
    /// produces all side effects; every later delivery of the same body is
    /// acknowledged with `duplicate: true` and mutates nothing.
    pub async fn process(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookAck, WebhookError> {
        // 1. Signature, before any parsing. Forged events are not recorded,
        //    so they cannot pollute the dedup table.
        let signature = signature.ok_or(SignatureError::Missing)?;
        verify_signature(body, signature, &self.secret)?;

        let event = parse_event(body)?;
        let mapped = map_provider_status(&event.payment_status);

        // 2. Dedup. INSERT first; the unique hash resolves races, and the
        //    loser treats the event as already processed.
        let hash = content_hash(body);
        let now = now_millis();
        let row = WebhookEvent {
            id: snowflake_id(),
            event_hash: hash.clone(),
            payment_id: event.payment_id.clone(),
            order_id: event.order_id,
            raw_payload: String::from_utf8_lossy(body).into_owned(),
            received_at: now,
            processed_at: None,
        };
        if !self.store.insert_event(&row).await? {
            tracing::info!(
                payment_id = %event.payment_id,
                event_hash = %hash,
                "duplicate webhook delivery, skipping"
            );
            return Ok(WebhookAck::duplicate(mapped));
        }

        // 3. Status mapping. An unknown vocabulary string stays recorded
        //    (retrying it can never succeed) but is answered 400.
        let Some(status) = mapped else {
            self.store.mark_event_processed(&hash, now_millis()).await?;
            return Err(WebhookError::UnknownStatus(event.payment_status));
        };

        // 4. Apply. The payment record always reflects the latest event;
        //    only terminal statuses drive the order state machine.
        self.store
            .upsert_payment(&Payment {
                payment_id: event.payment_id.clone(),
                order_id: event.order_id,
                amount_paid: event.actually_paid,
                status,
                raw_status: event.payment_status.clone(),
                updated_at: now_millis(),
            })
            .await?;

        let mut applied_transition = None;
        if status.is_terminal()
            && let Some(order_id) = event.order_id
        {
            let target = match status {
                PaymentStatus::Succeeded => OrderStatus::Paid,
                _ => OrderStatus::Cancelled,
            };
            match self.machine.transition(order_id, target, None).await {
                Ok(report) => applied_transition = Some((order_id, report.to)),
                // Out-of-order or repeated-meaning events are normal traffic:
                // the permitted-transition check is the ordering guard, and a
                // rejected stale event is consumed, not retried.
                Err(
                    e @ (TransitionError::NotPermitted { .. }
                    | TransitionError::OrderNotFound(_)
                    | TransitionError::Conflict(_)),
                ) => {
                    tracing::warn!(
                        order_id,
                        payment_id = %event.payment_id,
                        error = %e,
                        "webhook transition rejected, event consumed"
                    );
                }
                Err(TransitionError::Deduct { sku_id, source }) => {
                    tracing::error!(order_id, sku_id, error = %source, "stock deduction failed");
                    return Err(WebhookError::Store(StoreError::Integrity(format!(
                        "deduction failed for sku {sku_id}: {source}"
                    ))));
                }
                Err(TransitionError::Store(e)) => return Err(e.into()),
            }
        }

        self.store.mark_event_processed(&hash, now_millis()).await?;
        tracing::info!(
            payment_id = %event.payment_id,
            status = status.as_str(),
            order_id = event.order_id,
            "webhook processed"
        );

        // 5. Best-effort notification, after the core update committed. A
        //    failure here surfaces as 502 but is never rolled back; the
        //    gateway's retry hits the dedup path and gets a 200.
        if let Some((order_id, new_status)) = applied_transition
            && let Err(e) = self.notifier.order_status_changed(order_id, new_status).await
        {
            tracing::warn!(order_id, error = %e, "downstream notification failed");
            return Err(WebhookError::Notify(e.to_string()));
        }

        Ok(WebhookAck::accepted(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_string_and_numeric_ids() {
        let body = br#"{"payment_id": 42, "order_id": "77", "payment_status": "waiting"}"#;
        let event = parse_event(body).unwrap();
        assert_eq!(event.payment_id, "42");
        assert_eq!(event.order_id, Some(77));

        let body = br#"{"payment_id": "abc", "order_id": 77, "payment_status": "waiting"}"#;
        let event = parse_event(body).unwrap();
        assert_eq!(event.payment_id, "abc");
        assert_eq!(event.order_id, Some(77));
    }

    #[test]
    fn parse_rejects_missing_fields() {
        assert!(matches!(
            parse_event(br#"{"order_id": 1, "payment_status": "waiting"}"#),
            Err(WebhookError::Malformed(_))
        ));
        assert!(matches!(
            parse_event(br#"{"payment_id": 1}"#),
            Err(WebhookError::Malformed(_))
        ));
        assert!(matches!(
            parse_event(b"not json"),
            Err(WebhookError::Malformed(_))
        ));
    }

    #[test]
    fn parse_defaults_missing_amount_to_zero() {
        let body = br#"{"payment_id": 1, "payment_status": "finished"}"#;
        let event = parse_event(body).unwrap();
        assert_eq!(event.actually_paid, Decimal::ZERO);
    }
}
