//! Provider payment status mapping
//!
//! The gateway speaks its own vocabulary; the domain only knows
//! `PaymentStatus`. The table is fixed — an unmapped string is rejected
//! rather than guessed at.

use shared::models::payment::PaymentStatus;

/// Map the provider vocabulary onto the domain status set
pub fn map_provider_status(raw: &str) -> Option<PaymentStatus> {
    match raw {
        "waiting" => Some(PaymentStatus::Pending),
        "confirming" | "confirmed" | "sending" | "partially_paid" => {
            Some(PaymentStatus::Processing)
        }
        "finished" => Some(PaymentStatus::Succeeded),
        "failed" | "refunded" => Some(PaymentStatus::Failed),
        "canceled" => Some(PaymentStatus::Canceled),
        "expired" => Some(PaymentStatus::Expired),
        _ => None,
    }
}
