//! Payment and webhook event models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Domain payment status (provider vocabulary is mapped onto this set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    Expired,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Expired => "expired",
        }
    }

    /// Terminal statuses drive an order transition; non-terminal statuses
    /// only update the payment record.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed | Self::Canceled | Self::Expired
        )
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "succeeded" => Ok(Self::Succeeded),
            "failed" => Ok(Self::Failed),
            "canceled" => Ok(Self::Canceled),
            "expired" => Ok(Self::Expired),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

/// Payment record, keyed by the gateway's payment id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: String,
    pub order_id: Option<i64>,
    /// Amount actually paid, as reported by the gateway
    pub amount_paid: Decimal,
    pub status: PaymentStatus,
    /// Provider vocabulary status as received, kept for audit
    pub raw_status: String,
    pub updated_at: i64,
}

/// Accepted gateway notification, persisted for replay/audit
///
/// A row with `processed_at` set means the event already produced its side
/// effects; redelivery of the same body is a no-op. The unique hash makes
/// concurrent duplicate inserts race-safe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: i64,
    /// SHA-256 hex of the exact raw payload, unique
    pub event_hash: String,
    pub payment_id: String,
    pub order_id: Option<i64>,
    pub raw_payload: String,
    pub received_at: i64,
    pub processed_at: Option<i64>,
}

/// Webhook endpoint response body
///
/// The gateway only retries on non-2xx; replays of an already-processed
/// event are acknowledged with `duplicate: true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PaymentStatus>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub duplicate: bool,
}

impl WebhookAck {
    pub fn accepted(status: PaymentStatus) -> Self {
        Self {
            ok: true,
            status: Some(status),
            duplicate: false,
        }
    }

    pub fn duplicate(status: Option<PaymentStatus>) -> Self {
        Self {
            ok: true,
            status,
            duplicate: true,
        }
    }
}
