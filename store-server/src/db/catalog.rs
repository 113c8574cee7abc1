//! Product and SKU queries

use sqlx::PgPool;

use shared::models::sku::{Product, Sku, VariantAttribute};

use super::StoreResult;

#[derive(sqlx::FromRow)]
struct SkuRow {
    id: i64,
    product_id: i64,
    sku_code: String,
    /// JSON-encoded `Vec<VariantAttribute>`, order preserved
    attributes: String,
    price: rust_decimal::Decimal,
    is_active: bool,
    created_at: i64,
}

impl SkuRow {
    fn into_sku(self) -> StoreResult<Sku> {
        let attributes: Vec<VariantAttribute> = serde_json::from_str(&self.attributes)?;
        Ok(Sku {
            id: self.id,
            product_id: self.product_id,
            sku_code: self.sku_code,
            attributes,
            price: self.price,
            is_active: self.is_active,
            created_at: self.created_at,
        })
    }
}

pub async fn create_product(pool: &PgPool, product: &Product) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO products (id, name, image, is_active) VALUES ($1, $2, $3, $4)",
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.image)
    .bind(product.is_active)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_product(pool: &PgPool, id: i64) -> StoreResult<Option<Product>> {
    let row: Option<(i64, String, String, bool)> =
        sqlx::query_as("SELECT id, name, image, is_active FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|(id, name, image, is_active)| Product {
        id,
        name,
        image,
        is_active,
    }))
}

pub async fn create_sku(pool: &PgPool, sku: &Sku) -> StoreResult<()> {
    let attributes = serde_json::to_string(&sku.attributes)?;
    sqlx::query(
        r#"
        INSERT INTO skus (id, product_id, sku_code, attributes, price, is_active, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(sku.id)
    .bind(sku.product_id)
    .bind(&sku.sku_code)
    .bind(&attributes)
    .bind(sku.price)
    .bind(sku.is_active)
    .bind(sku.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_sku(pool: &PgPool, id: i64) -> StoreResult<Option<Sku>> {
    let row: Option<SkuRow> = sqlx::query_as(
        "SELECT id, product_id, sku_code, attributes, price, is_active, created_at
         FROM skus WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.map(SkuRow::into_sku).transpose()
}

pub async fn skus_for_product(pool: &PgPool, product_id: i64) -> StoreResult<Vec<Sku>> {
    let rows: Vec<SkuRow> = sqlx::query_as(
        "SELECT id, product_id, sku_code, attributes, price, is_active, created_at
         FROM skus WHERE product_id = $1 ORDER BY id",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(SkuRow::into_sku).collect()
}

pub async fn deactivate_sku(pool: &PgPool, id: i64) -> StoreResult<bool> {
    let result = sqlx::query("UPDATE skus SET is_active = FALSE WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
