//! Notification boundary
//!
//! Order status changes are pushed to an external notification service
//! (email/shipping integration). The push is best-effort: the webhook
//! gate's core update is never rolled back because a notification failed.

use async_trait::async_trait;
use thiserror::Error;

use shared::models::order::OrderStatus;

#[derive(Debug, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn order_status_changed(
        &self,
        order_id: i64,
        status: OrderStatus,
    ) -> Result<(), NotifyError>;
}

/// POSTs status changes to a configured HTTP endpoint
pub struct HttpNotifier {
    client: reqwest::Client,
    url: String,
}

impl HttpNotifier {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn order_status_changed(
        &self,
        order_id: i64,
        status: OrderStatus,
    ) -> Result<(), NotifyError> {
        let body = serde_json::json!({
            "order_id": order_id,
            "status": status,
        });
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError(e.to_string()))?;
        if !response.status().is_success() {
            return Err(NotifyError(format!(
                "notification endpoint returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Used when no notification endpoint is configured
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn order_status_changed(
        &self,
        order_id: i64,
        status: OrderStatus,
    ) -> Result<(), NotifyError> {
        tracing::debug!(order_id, status = %status, "notification skipped (no endpoint)");
        Ok(())
    }
}
