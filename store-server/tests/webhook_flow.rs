//! Webhook ingestion: signature, idempotence, ordering, notification

mod common;

use common::*;

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};

use shared::models::order::OrderStatus;
use shared::models::payment::PaymentStatus;
use store_server::db::memory::MemoryStore;
use store_server::db::{OrderStore, WebhookStore};
use store_server::notify::{Notifier, NotifyError};
use store_server::state::AppState;
use store_server::webhook::{content_hash, sign, WebhookError};

type Fixture = (AppState, Arc<MemoryStore>, i64);

/// Standard payload for an order's successful payment
fn finished_payload(order_id: i64) -> serde_json::Value {
    serde_json::json!({
        "payment_id": 555001,
        "order_id": order_id,
        "payment_status": "finished",
        "actually_paid": 49.98,
    })
}

async fn paid_order_fixture() -> Fixture {
    let (state, store) = test_state().await;
    seed_catalog(&store, 10, 100, 6).await;
    let order_id = checkout_one(&state, 10, 2).await.order.id;
    (state, store, order_id)
}

#[tokio::test]
async fn payment_webhook_confirms_order_and_deducts_reserved() {
    let (state, store, order_id) = paid_order_fixture().await;
    assert_eq!(counters(&store, 100).await, (4, 2));

    let (body, sig) = signed_payload(&finished_payload(order_id));
    let ack = state.gate.process(&body, Some(&sig)).await.unwrap();

    assert!(ack.ok);
    assert!(!ack.duplicate);
    assert_eq!(ack.status, Some(PaymentStatus::Succeeded));

    // Order paid, reserved drained, available untouched
    let order = store.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Paid);
    assert!(order.paid_at.is_some());
    assert_eq!(counters(&store, 100).await, (4, 0));

    // Exactly one 支付已完成 tracking row
    let tracking = store.order_tracking(order_id).await.unwrap();
    let paid_rows: Vec<_> = tracking
        .iter()
        .filter(|t| t.description == "支付已完成")
        .collect();
    assert_eq!(paid_rows.len(), 1);

    // Payment record reflects the gateway's numbers
    let payment = store.get_payment("555001").await.unwrap().unwrap();
    assert_eq!(payment.order_id, Some(order_id));
    assert_eq!(payment.status, PaymentStatus::Succeeded);
    assert_eq!(payment.raw_status, "finished");

    // Event persisted and marked processed
    let event = store.get_event(&content_hash(&body)).await.unwrap().unwrap();
    assert!(event.processed_at.is_some());
}

#[tokio::test]
async fn identical_redelivery_is_acknowledged_without_side_effects() {
    let (state, store, order_id) = paid_order_fixture().await;
    let (body, sig) = signed_payload(&finished_payload(order_id));

    state.gate.process(&body, Some(&sig)).await.unwrap();
    let counters_after_first = counters(&store, 100).await;
    let tracking_after_first = store.order_tracking(order_id).await.unwrap().len();

    // Same body, same signature — the gateway retrying
    let ack = state.gate.process(&body, Some(&sig)).await.unwrap();

    assert!(ack.ok);
    assert!(ack.duplicate);
    assert_eq!(ack.status, Some(PaymentStatus::Succeeded));
    assert_eq!(counters(&store, 100).await, counters_after_first);
    assert_eq!(
        store.order_tracking(order_id).await.unwrap().len(),
        tracking_after_first
    );
}

#[tokio::test]
async fn tampered_body_is_rejected_without_recording() {
    let (state, store, order_id) = paid_order_fixture().await;
    let (body, sig) = signed_payload(&finished_payload(order_id));

    let mut tampered = body.clone();
    let pos = tampered.len() - 2;
    tampered[pos] ^= 1;

    let err = state.gate.process(&tampered, Some(&sig)).await.unwrap_err();
    assert!(matches!(err, WebhookError::Signature(_)));

    // No event row, no order change, no stock effect
    assert!(store
        .get_event(&content_hash(&tampered))
        .await
        .unwrap()
        .is_none());
    let order = store.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(counters(&store, 100).await, (4, 2));
}

#[tokio::test]
async fn missing_signature_is_rejected() {
    let (state, _store, order_id) = paid_order_fixture().await;
    let (body, _) = signed_payload(&finished_payload(order_id));

    let err = state.gate.process(&body, None).await.unwrap_err();
    assert!(matches!(err, WebhookError::Signature(_)));
}

#[tokio::test]
async fn stale_success_after_cancellation_is_consumed_without_effect() {
    let (state, store, order_id) = paid_order_fixture().await;

    // Expiry arrives first and cancels the order
    let (body, sig) = signed_payload(&serde_json::json!({
        "payment_id": 555001,
        "order_id": order_id,
        "payment_status": "expired",
    }));
    state.gate.process(&body, Some(&sig)).await.unwrap();
    assert_eq!(counters(&store, 100).await, (6, 0));

    // A late "finished" for the same order is a distinct body, so dedup does
    // not catch it — the terminal-state check does
    let (late, late_sig) = signed_payload(&finished_payload(order_id));
    let ack = state.gate.process(&late, Some(&late_sig)).await.unwrap();
    assert!(ack.ok);
    assert!(!ack.duplicate);

    let order = store.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    // No deduction happened against the released stock
    assert_eq!(counters(&store, 100).await, (6, 0));
}

#[tokio::test]
async fn non_terminal_status_updates_payment_record_only() {
    let (state, store, order_id) = paid_order_fixture().await;
    let (body, sig) = signed_payload(&serde_json::json!({
        "payment_id": "pay-xyz",
        "order_id": order_id,
        "payment_status": "confirming",
        "actually_paid": 12.5,
    }));

    let ack = state.gate.process(&body, Some(&sig)).await.unwrap();
    assert_eq!(ack.status, Some(PaymentStatus::Processing));

    let payment = store.get_payment("pay-xyz").await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Processing);

    let order = store.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(store.order_tracking(order_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_provider_status_is_rejected_but_consumed() {
    let (state, store, order_id) = paid_order_fixture().await;
    let (body, sig) = signed_payload(&serde_json::json!({
        "payment_id": 1,
        "order_id": order_id,
        "payment_status": "galactic_settlement",
    }));

    let err = state.gate.process(&body, Some(&sig)).await.unwrap_err();
    assert!(matches!(err, WebhookError::UnknownStatus(_)));

    // Recorded and marked processed: retrying an unmappable event is useless
    let event = store.get_event(&content_hash(&body)).await.unwrap().unwrap();
    assert!(event.processed_at.is_some());

    let ack = state.gate.process(&body, Some(&sig)).await.unwrap();
    assert!(ack.duplicate);
}

/// Notifier that always fails, for the 502 path
struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn order_status_changed(
        &self,
        _order_id: i64,
        _status: OrderStatus,
    ) -> Result<(), NotifyError> {
        Err(NotifyError("endpoint unreachable".into()))
    }
}

#[tokio::test]
async fn notification_failure_never_rolls_back_the_core_update() {
    let (state, store) = test_state_with_notifier(Arc::new(FailingNotifier)).await;
    seed_catalog(&store, 10, 100, 6).await;
    let order_id = checkout_one(&state, 10, 2).await.order.id;

    let (body, sig) = signed_payload(&finished_payload(order_id));
    let err = state.gate.process(&body, Some(&sig)).await.unwrap_err();
    assert!(matches!(err, WebhookError::Notify(_)));

    // The financial update stuck
    let order = store.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Paid);
    let event = store.get_event(&content_hash(&body)).await.unwrap().unwrap();
    assert!(event.processed_at.is_some());

    // The gateway retries the 502 and gets a duplicate success
    let ack = state.gate.process(&body, Some(&sig)).await.unwrap();
    assert!(ack.ok);
    assert!(ack.duplicate);
}

#[tokio::test]
async fn http_handler_maps_outcomes_to_status_codes() {
    let (state, _store, order_id) = paid_order_fixture().await;
    let (body, sig) = signed_payload(&finished_payload(order_id));

    // Valid delivery → 200 {ok:true}
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-provider-signature",
        HeaderValue::from_str(&sig).unwrap(),
    );
    let (status, axum::Json(value)) = store_server::api::webhook::handle_webhook(
        State(state.clone()),
        headers.clone(),
        Bytes::from(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["ok"], serde_json::json!(true));
    assert!(value.get("duplicate").is_none());

    // Replay → 200 {ok:true, duplicate:true}
    let (status, axum::Json(value)) = store_server::api::webhook::handle_webhook(
        State(state.clone()),
        headers.clone(),
        Bytes::from(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["duplicate"], serde_json::json!(true));

    // Bad signature → 401
    let mut bad = HeaderMap::new();
    bad.insert(
        "x-provider-signature",
        HeaderValue::from_str(&sign(b"other", WEBHOOK_SECRET)).unwrap(),
    );
    let (status, _) = store_server::api::webhook::handle_webhook(
        State(state.clone()),
        bad,
        Bytes::from(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Malformed JSON (signed correctly) → 400
    let garbage = b"not json at all".to_vec();
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-provider-signature",
        HeaderValue::from_str(&sign(&garbage, WEBHOOK_SECRET)).unwrap(),
    );
    let (status, _) = store_server::api::webhook::handle_webhook(
        State(state),
        headers,
        Bytes::from(garbage),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
