//! Payment gateway webhook handler
//!
//! POST /webhook/payment — raw body, HMAC-SHA512 signature in
//! `x-provider-signature`. The pipeline itself lives in
//! [`crate::webhook::WebhookGate`]; this handler only maps its outcome onto
//! HTTP. The gateway retries on non-2xx, so replayed deliveries must come
//! back 200 — the dedup path guarantees that.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use shared::models::payment::WebhookAck;

use crate::state::AppState;
use crate::webhook::WebhookError;

/// Signature header set by the payment gateway
pub const SIGNATURE_HEADER: &str = "x-provider-signature";

/// POST /webhook/payment
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<serde_json::Value>) {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    match state.gate.process(&body, signature).await {
        Ok(ack) => ack_response(StatusCode::OK, &ack),
        Err(WebhookError::Signature(e)) => {
            tracing::warn!(error = %e, "webhook signature rejected");
            error_response(StatusCode::UNAUTHORIZED, "invalid signature")
        }
        Err(WebhookError::Malformed(e)) => {
            tracing::warn!(error = %e, "malformed webhook payload");
            error_response(StatusCode::BAD_REQUEST, "malformed payload")
        }
        Err(WebhookError::UnknownStatus(raw)) => {
            tracing::warn!(raw_status = %raw, "unknown provider payment status");
            error_response(StatusCode::BAD_REQUEST, "unknown payment status")
        }
        Err(WebhookError::Store(e)) => {
            tracing::error!(error = %e, "webhook processing failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "processing failed")
        }
        // Core update committed; only the downstream notification failed.
        // 502 signals the operator, the retry is answered as a duplicate.
        Err(WebhookError::Notify(e)) => {
            tracing::warn!(error = %e, "notification failed after commit");
            error_response(StatusCode::BAD_GATEWAY, "notification failed")
        }
    }
}

fn ack_response(status: StatusCode, ack: &WebhookAck) -> (StatusCode, Json<serde_json::Value>) {
    (
        status,
        Json(serde_json::to_value(ack).unwrap_or_else(|_| serde_json::json!({"ok": true}))),
    )
}

fn error_response(
    status: StatusCode,
    message: &str,
) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(serde_json::json!({"ok": false, "error": message})))
}
