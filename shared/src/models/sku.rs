//! Product and SKU models
//!
//! A SKU is one concrete sellable variant of a product (product + attribute
//! combination). SKUs are deactivated rather than destroyed because
//! historical order items keep referencing them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product metadata (read-only input from the catalog)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub is_active: bool,
}

/// One named variant attribute, e.g. `{name: "color", value: "Navy"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantAttribute {
    pub name: String,
    pub value: String,
}

impl VariantAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Case-insensitive match on both name and value
    pub fn matches(&self, other: &VariantAttribute) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
            && self.value.eq_ignore_ascii_case(&other.value)
    }
}

/// Stock-keeping unit: one purchasable variant of a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sku {
    pub id: i64,
    pub product_id: i64,
    /// Human-readable code derived from product id + attribute values.
    /// Informational only, not a key; collisions across products are fine.
    pub sku_code: String,
    /// Ordered attribute set (e.g. color, size)
    pub attributes: Vec<VariantAttribute>,
    /// Unit price in currency unit
    pub price: Decimal,
    pub is_active: bool,
    pub created_at: i64,
}

impl Sku {
    /// Find an attribute value by name (case-insensitive)
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }
}

/// Merchant SKU creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkuCreate {
    pub product_id: i64,
    pub attributes: Vec<VariantAttribute>,
    pub price: Decimal,
    /// Initial on-hand quantity, seeded at the target warehouse
    #[serde(default)]
    pub initial_stock: i32,
    /// Low-stock alert threshold for the seeded row
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: i32,
    /// Target warehouse; default warehouse when omitted
    pub warehouse_id: Option<i64>,
}

fn default_alert_threshold() -> i32 {
    5
}

/// Variant resolution query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveRequest {
    pub product_id: i64,
    pub attributes: Vec<VariantAttribute>,
}
