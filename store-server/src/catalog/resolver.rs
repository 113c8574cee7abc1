//! Variant resolution
//!
//! Maps a (product, attribute selection) pair to a concrete SKU. Pure
//! lookup, no mutation. `None` means "cannot sell this configuration" —
//! callers must not confuse it with a stock-out.

use std::sync::Arc;

use shared::models::sku::{Sku, VariantAttribute};

use crate::db::{CatalogStore, Store, StoreResult};

#[derive(Clone)]
pub struct SkuResolver {
    store: Arc<dyn Store>,
}

impl SkuResolver {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Find the active SKU matching the supplied attributes.
    ///
    /// Superset match: every supplied attribute must match one of the SKU's
    /// attributes (case-insensitive on name and value); SKU attributes not
    /// supplied are not required to match, so a partial selection resolves
    /// as long as it is unambiguous enough for the catalog data.
    pub async fn resolve(
        &self,
        product_id: i64,
        attributes: &[VariantAttribute],
    ) -> StoreResult<Option<Sku>> {
        let skus = self.store.skus_for_product(product_id).await?;
        Ok(skus
            .into_iter()
            .filter(|sku| sku.is_active)
            .find(|sku| attribute_superset_match(&sku.attributes, attributes)))
    }
}

/// True when every queried attribute matches some SKU attribute
fn attribute_superset_match(
    sku_attributes: &[VariantAttribute],
    query: &[VariantAttribute],
) -> bool {
    query
        .iter()
        .all(|q| sku_attributes.iter().any(|a| a.matches(q)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::db::CatalogStore;
    use rust_decimal::Decimal;

    fn sku(id: i64, product_id: i64, attrs: &[(&str, &str)], active: bool) -> Sku {
        Sku {
            id,
            product_id,
            sku_code: format!("TEST-{id}"),
            attributes: attrs
                .iter()
                .map(|(n, v)| VariantAttribute::new(*n, *v))
                .collect(),
            price: Decimal::new(1999, 2),
            is_active: active,
            created_at: 0,
        }
    }

    #[test]
    fn superset_match_is_case_insensitive() {
        let sku_attrs = vec![
            VariantAttribute::new("Color", "Navy"),
            VariantAttribute::new("Size", "XL"),
        ];
        let query = vec![VariantAttribute::new("color", "NAVY")];
        assert!(attribute_superset_match(&sku_attrs, &query));

        let wrong = vec![VariantAttribute::new("color", "Red")];
        assert!(!attribute_superset_match(&sku_attrs, &wrong));
    }

    #[test]
    fn empty_query_matches_any_sku() {
        let sku_attrs = vec![VariantAttribute::new("size", "M")];
        assert!(attribute_superset_match(&sku_attrs, &[]));
    }

    #[tokio::test]
    async fn resolve_skips_inactive_skus() {
        let store = Arc::new(MemoryStore::new());
        store
            .create_sku(&sku(1, 10, &[("color", "navy"), ("size", "m")], false))
            .await
            .unwrap();
        store
            .create_sku(&sku(2, 10, &[("color", "navy"), ("size", "l")], true))
            .await
            .unwrap();

        let resolver = SkuResolver::new(store);
        let found = resolver
            .resolve(10, &[VariantAttribute::new("color", "navy")])
            .await
            .unwrap();
        assert_eq!(found.map(|s| s.id), Some(2));
    }

    #[tokio::test]
    async fn resolve_requires_all_supplied_attributes() {
        let store = Arc::new(MemoryStore::new());
        store
            .create_sku(&sku(1, 10, &[("color", "navy"), ("size", "m")], true))
            .await
            .unwrap();

        let resolver = SkuResolver::new(store);
        let none = resolver
            .resolve(
                10,
                &[
                    VariantAttribute::new("color", "navy"),
                    VariantAttribute::new("size", "xl"),
                ],
            )
            .await
            .unwrap();
        assert!(none.is_none());
    }
}
