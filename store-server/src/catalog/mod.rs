//! Catalog services: SKU management and variant resolution

mod resolver;

pub use resolver::SkuResolver;

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;

use shared::models::sku::{Sku, SkuCreate, VariantAttribute};
use shared::util::{now_millis, snowflake_id};

use crate::db::{CatalogStore, StockStore, Store, StoreError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("product {0} not found")]
    ProductNotFound(i64),

    #[error("SKU price must be positive")]
    InvalidPrice,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Merchant-facing SKU management
#[derive(Clone)]
pub struct SkuService {
    store: Arc<dyn Store>,
    default_warehouse_id: i64,
}

impl SkuService {
    pub fn new(store: Arc<dyn Store>, default_warehouse_id: i64) -> Self {
        Self {
            store,
            default_warehouse_id,
        }
    }

    /// Create a SKU and seed its stock row at the target warehouse.
    ///
    /// The code is derived from product id + attribute values; it is
    /// informational and collisions across products are acceptable.
    pub async fn create_sku(&self, req: SkuCreate) -> Result<Sku, CatalogError> {
        if req.price <= Decimal::ZERO {
            return Err(CatalogError::InvalidPrice);
        }
        let product = self
            .store
            .get_product(req.product_id)
            .await?
            .ok_or(CatalogError::ProductNotFound(req.product_id))?;

        let now = now_millis();
        let sku = Sku {
            id: snowflake_id(),
            product_id: product.id,
            sku_code: sku_code(product.id, &req.attributes),
            attributes: req.attributes,
            price: req.price,
            is_active: true,
            created_at: now,
        };
        self.store.create_sku(&sku).await?;

        let warehouse_id = req.warehouse_id.unwrap_or(self.default_warehouse_id);
        self.store
            .seed_stock(
                sku.id,
                warehouse_id,
                req.initial_stock.max(0),
                req.alert_threshold.max(0),
                None,
                now,
            )
            .await?;

        tracing::info!(
            sku_id = sku.id,
            sku_code = %sku.sku_code,
            product_id = product.id,
            initial_stock = req.initial_stock,
            "SKU created"
        );
        Ok(sku)
    }

    /// Soft delete — historical order items keep referencing the SKU
    pub async fn deactivate_sku(&self, id: i64) -> Result<bool, CatalogError> {
        let found = self.store.deactivate_sku(id).await?;
        if found {
            tracing::info!(sku_id = id, "SKU deactivated");
        }
        Ok(found)
    }
}

/// Deterministic SKU code: uppercase first 8 chars of the product id,
/// then up to the first 3 uppercase chars of each attribute value,
/// joined by "-".
pub fn sku_code(product_id: i64, attributes: &[VariantAttribute]) -> String {
    let id_str = product_id.to_string();
    let prefix: String = id_str.chars().take(8).collect();
    let mut parts = vec![prefix.to_uppercase()];
    for attr in attributes {
        let short: String = attr.value.chars().take(3).collect();
        parts.push(short.to_uppercase());
    }
    parts.join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sku_code_is_deterministic() {
        let attrs = vec![
            VariantAttribute::new("color", "Navy"),
            VariantAttribute::new("size", "XL"),
        ];
        assert_eq!(sku_code(123456789, &attrs), "12345678-NAV-XL");
        assert_eq!(sku_code(123456789, &attrs), "12345678-NAV-XL");
    }

    #[test]
    fn sku_code_without_attributes() {
        assert_eq!(sku_code(42, &[]), "42");
    }

    #[test]
    fn sku_code_short_values() {
        let attrs = vec![VariantAttribute::new("size", "s")];
        assert_eq!(sku_code(99, &attrs), "99-S");
    }
}
