//! Stock models
//!
//! Per-(SKU, warehouse) counters plus the append-only movement log.
//! `total = available + reserved` is the physical count; it only changes
//! via adjustment/transfer, never via reserve/release/deduct.

use serde::{Deserialize, Serialize};

/// A location-scoped inventory pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: i64,
    pub name: String,
    pub is_default: bool,
}

/// Live counters for one (SKU, warehouse) pair
///
/// Invariant: `available >= 0` and `reserved >= 0` at all times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockInfo {
    pub sku_id: i64,
    pub warehouse_id: i64,
    /// Sellable now
    pub available: i32,
    /// Held against open orders
    pub reserved: i32,
    pub alert_threshold: i32,
}

impl StockInfo {
    pub fn total(&self) -> i32 {
        self.available + self.reserved
    }

    pub fn is_low(&self) -> bool {
        self.available <= self.alert_threshold
    }
}

/// Aggregated stock view returned by `get_stock_info`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLevel {
    pub available: i32,
    pub reserved: i32,
    pub total: i32,
    pub alert_threshold: i32,
}

/// Stock movement type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Purchase,
    Sale,
    Transfer,
    Adjustment,
    Return,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Sale => "sale",
            Self::Transfer => "transfer",
            Self::Adjustment => "adjustment",
            Self::Return => "return",
        }
    }
}

impl std::str::FromStr for MovementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "purchase" => Ok(Self::Purchase),
            "sale" => Ok(Self::Sale),
            "transfer" => Ok(Self::Transfer),
            "adjustment" => Ok(Self::Adjustment),
            "return" => Ok(Self::Return),
            other => Err(format!("unknown movement type: {other}")),
        }
    }
}

/// Immutable audit row — never edited or deleted
///
/// Every counter mutation produces exactly one movement row (two for
/// transfers, one per warehouse). Movements are the reconciliation source
/// of truth for the live counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: i64,
    pub sku_id: i64,
    pub warehouse_id: i64,
    /// Signed delta applied to the pool
    pub quantity: i32,
    pub movement_type: MovementType,
    /// Order id for sale/return movements
    pub reference_id: Option<i64>,
    pub reason: Option<String>,
    pub created_by: Option<String>,
    pub created_at: i64,
}

/// Manual stock correction payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAdjustRequest {
    pub sku_id: i64,
    /// Signed delta to `available` (receiving stock, write-offs)
    pub delta: i32,
    pub reason: String,
    pub warehouse_id: Option<i64>,
    pub created_by: Option<String>,
}

/// Warehouse-to-warehouse transfer payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockTransferRequest {
    pub sku_id: i64,
    pub from_warehouse_id: i64,
    pub to_warehouse_id: i64,
    pub quantity: i32,
    pub reason: String,
    pub created_by: Option<String>,
}
