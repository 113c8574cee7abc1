//! Order models
//!
//! An order moves `pending → paid → shipped → delivered`, with an explicit
//! cancellation edge from `pending`/`paid`. `delivered` and `cancelled` are
//! terminal. Status is persisted together with a per-milestone timestamp and
//! an append-only tracking timeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::sku::VariantAttribute;

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Permitted successor states
    pub fn successors(&self) -> &'static [OrderStatus] {
        match self {
            Self::Pending => &[Self::Paid, Self::Cancelled],
            Self::Paid => &[Self::Shipped, Self::Cancelled],
            Self::Shipped => &[Self::Delivered],
            Self::Delivered | Self::Cancelled => &[],
        }
    }

    /// Whether `next` is a permitted successor of `self`
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.successors().contains(&next)
    }

    /// Terminal states permit no further transition
    pub fn is_terminal(&self) -> bool {
        self.successors().is_empty()
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub status: OrderStatus,
    /// Total amount in currency unit
    pub total_amount: Decimal,
    pub shipping_address: String,
    pub created_at: i64,
    pub paid_at: Option<i64>,
    pub shipped_at: Option<i64>,
    pub delivered_at: Option<i64>,
    pub cancelled_at: Option<i64>,
}

/// Order line item — a snapshot taken at time of purchase
///
/// Product name/image/price/size/color are copied so later catalog edits
/// never retroactively change historical orders. `sku_id` stays as the
/// link to the stock ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub sku_id: i64,
    /// Warehouse the reservation was taken from; release/deduct must credit
    /// the same pool that was debited at checkout.
    pub warehouse_id: i64,
    pub product_name: String,
    pub product_image: String,
    /// Unit price at time of purchase
    pub unit_price: Decimal,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// Append-only timeline entry, one per status change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderTracking {
    pub id: i64,
    pub order_id: i64,
    pub status: OrderStatus,
    pub description: String,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub created_at: i64,
}

/// One checkout line: a variant selection plus quantity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutLine {
    pub product_id: i64,
    pub attributes: Vec<VariantAttribute>,
    pub quantity: i32,
}

/// Checkout payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub lines: Vec<CheckoutLine>,
    pub shipping_address: String,
}

/// Shipping milestone payload (merchant back-office)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipRequest {
    pub carrier: String,
    pub tracking_number: String,
}

/// Per-item result of a best-effort release batch
///
/// Cancellation releases each item independently; one item's failure never
/// blocks the others, so the caller gets a list instead of all-or-nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseOutcome {
    pub sku_id: i64,
    pub warehouse_id: i64,
    pub quantity: i32,
    pub released: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Full order view: entity + item snapshots + tracking timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub tracking: Vec<OrderTracking>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Paid));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Paid.can_transition_to(Shipped));
        assert!(Paid.can_transition_to(Cancelled));
        assert!(Shipped.can_transition_to(Delivered));

        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Paid));
    }

    #[test]
    fn terminal_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Paid.is_terminal());
    }

    #[test]
    fn status_string_roundtrip() {
        for s in [
            OrderStatus::Pending,
            OrderStatus::Paid,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(s.as_str().parse::<OrderStatus>().unwrap(), s);
        }
    }
}
