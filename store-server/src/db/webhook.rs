//! Webhook event and payment record queries

use sqlx::PgPool;

use shared::models::payment::{Payment, PaymentStatus, WebhookEvent};

use super::{StoreError, StoreResult};

#[derive(sqlx::FromRow)]
struct EventRow {
    id: i64,
    event_hash: String,
    payment_id: String,
    order_id: Option<i64>,
    raw_payload: String,
    received_at: i64,
    processed_at: Option<i64>,
}

impl From<EventRow> for WebhookEvent {
    fn from(r: EventRow) -> Self {
        WebhookEvent {
            id: r.id,
            event_hash: r.event_hash,
            payment_id: r.payment_id,
            order_id: r.order_id,
            raw_payload: r.raw_payload,
            received_at: r.received_at,
            processed_at: r.processed_at,
        }
    }
}

/// INSERT first, check rows_affected — the unique hash eliminates the
/// check-then-insert race between two deliveries of the same body.
pub async fn insert_event(pool: &PgPool, event: &WebhookEvent) -> StoreResult<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO webhook_events
            (id, event_hash, payment_id, order_id, raw_payload, received_at, processed_at)
        VALUES ($1, $2, $3, $4, $5, $6, NULL)
        ON CONFLICT (event_hash) DO NOTHING
        "#,
    )
    .bind(event.id)
    .bind(&event.event_hash)
    .bind(&event.payment_id)
    .bind(event.order_id)
    .bind(&event.raw_payload)
    .bind(event.received_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn get_event(pool: &PgPool, event_hash: &str) -> StoreResult<Option<WebhookEvent>> {
    let row: Option<EventRow> = sqlx::query_as(
        r#"
        SELECT id, event_hash, payment_id, order_id, raw_payload, received_at, processed_at
        FROM webhook_events WHERE event_hash = $1
        "#,
    )
    .bind(event_hash)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(WebhookEvent::from))
}

pub async fn mark_event_processed(pool: &PgPool, event_hash: &str, now: i64) -> StoreResult<()> {
    let result = sqlx::query("UPDATE webhook_events SET processed_at = $2 WHERE event_hash = $1")
        .bind(event_hash)
        .bind(now)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::Integrity(format!(
            "webhook event {event_hash} not recorded"
        )));
    }
    Ok(())
}

pub async fn upsert_payment(pool: &PgPool, payment: &Payment) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO payments (payment_id, order_id, amount_paid, status, raw_status, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (payment_id) DO UPDATE SET
            order_id = EXCLUDED.order_id,
            amount_paid = EXCLUDED.amount_paid,
            status = EXCLUDED.status,
            raw_status = EXCLUDED.raw_status,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(&payment.payment_id)
    .bind(payment.order_id)
    .bind(payment.amount_paid)
    .bind(payment.status.as_str())
    .bind(&payment.raw_status)
    .bind(payment.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_payment(pool: &PgPool, payment_id: &str) -> StoreResult<Option<Payment>> {
    let row: Option<(String, Option<i64>, rust_decimal::Decimal, String, String, i64)> =
        sqlx::query_as(
            r#"
            SELECT payment_id, order_id, amount_paid, status, raw_status, updated_at
            FROM payments WHERE payment_id = $1
            "#,
        )
        .bind(payment_id)
        .fetch_optional(pool)
        .await?;
    row.map(
        |(payment_id, order_id, amount_paid, status, raw_status, updated_at)| {
            let status = status
                .parse::<PaymentStatus>()
                .map_err(StoreError::Integrity)?;
            Ok(Payment {
                payment_id,
                order_id,
                amount_paid,
                status,
                raw_status,
                updated_at,
            })
        },
    )
    .transpose()
}
