//! Stock counter and movement queries
//!
//! All counter mutations run inside one transaction with their movement row.
//! `reserve` and the source side of `transfer` are single guarded updates
//! (`... AND available >= $n`), so concurrent callers racing on the last
//! unit are serialized by the row lock and exactly one wins.

use sqlx::PgPool;

use shared::models::stock::{MovementType, StockInfo, StockMovement, Warehouse};
use shared::util::snowflake_id;

use super::{StoreError, StoreResult};

#[derive(sqlx::FromRow)]
struct MovementRow {
    id: i64,
    sku_id: i64,
    warehouse_id: i64,
    quantity: i32,
    movement_type: String,
    reference_id: Option<i64>,
    reason: Option<String>,
    created_by: Option<String>,
    created_at: i64,
}

impl MovementRow {
    fn into_movement(self) -> StoreResult<StockMovement> {
        let movement_type = self
            .movement_type
            .parse::<MovementType>()
            .map_err(StoreError::Integrity)?;
        Ok(StockMovement {
            id: self.id,
            sku_id: self.sku_id,
            warehouse_id: self.warehouse_id,
            quantity: self.quantity,
            movement_type,
            reference_id: self.reference_id,
            reason: self.reason,
            created_by: self.created_by,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct StockRow {
    sku_id: i64,
    warehouse_id: i64,
    available: i32,
    reserved: i32,
    alert_threshold: i32,
}

impl From<StockRow> for StockInfo {
    fn from(r: StockRow) -> Self {
        StockInfo {
            sku_id: r.sku_id,
            warehouse_id: r.warehouse_id,
            available: r.available,
            reserved: r.reserved,
            alert_threshold: r.alert_threshold,
        }
    }
}

/// Append one movement row inside the caller's transaction
async fn insert_movement(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    sku_id: i64,
    warehouse_id: i64,
    quantity: i32,
    movement_type: MovementType,
    reference_id: Option<i64>,
    reason: Option<&str>,
    created_by: Option<&str>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements
            (id, sku_id, warehouse_id, quantity, movement_type,
             reference_id, reason, created_by, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(snowflake_id())
    .bind(sku_id)
    .bind(warehouse_id)
    .bind(quantity)
    .bind(movement_type.as_str())
    .bind(reference_id)
    .bind(reason)
    .bind(created_by)
    .bind(now)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn create_warehouse(pool: &PgPool, warehouse: &Warehouse) -> StoreResult<()> {
    sqlx::query("INSERT INTO warehouses (id, name, is_default) VALUES ($1, $2, $3)")
        .bind(warehouse.id)
        .bind(&warehouse.name)
        .bind(warehouse.is_default)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn get_warehouse(pool: &PgPool, id: i64) -> StoreResult<Option<Warehouse>> {
    let row: Option<(i64, String, bool)> =
        sqlx::query_as("SELECT id, name, is_default FROM warehouses WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|(id, name, is_default)| Warehouse {
        id,
        name,
        is_default,
    }))
}

pub async fn stock_rows(
    pool: &PgPool,
    sku_id: i64,
    warehouse_id: Option<i64>,
) -> StoreResult<Vec<StockInfo>> {
    let rows: Vec<StockRow> = sqlx::query_as(
        r#"
        SELECT sku_id, warehouse_id, available, reserved, alert_threshold
        FROM stock_info
        WHERE sku_id = $1 AND ($2::bigint IS NULL OR warehouse_id = $2)
        ORDER BY warehouse_id
        "#,
    )
    .bind(sku_id)
    .bind(warehouse_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(StockInfo::from).collect())
}

pub async fn seed_stock(
    pool: &PgPool,
    sku_id: i64,
    warehouse_id: i64,
    quantity: i32,
    alert_threshold: i32,
    created_by: Option<&str>,
    now: i64,
) -> StoreResult<()> {
    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
        INSERT INTO stock_info (sku_id, warehouse_id, available, reserved, alert_threshold)
        VALUES ($1, $2, $3, 0, $4)
        ON CONFLICT (sku_id, warehouse_id) DO UPDATE SET
            available = stock_info.available + EXCLUDED.available,
            alert_threshold = EXCLUDED.alert_threshold
        "#,
    )
    .bind(sku_id)
    .bind(warehouse_id)
    .bind(quantity)
    .bind(alert_threshold)
    .execute(&mut *tx)
    .await?;
    if quantity > 0 {
        insert_movement(
            &mut tx,
            sku_id,
            warehouse_id,
            quantity,
            MovementType::Purchase,
            None,
            Some("stock received"),
            created_by,
            now,
        )
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

pub async fn reserve(
    pool: &PgPool,
    sku_id: i64,
    warehouse_id: i64,
    quantity: i32,
    order_id: i64,
    now: i64,
) -> StoreResult<bool> {
    let mut tx = pool.begin().await?;
    // Single conditional update — never read-then-write. Two near-simultaneous
    // checkouts for the last unit serialize on the row lock; the second one
    // re-evaluates the predicate and matches zero rows.
    let result = sqlx::query(
        r#"
        UPDATE stock_info
        SET available = available - $3, reserved = reserved + $3
        WHERE sku_id = $1 AND warehouse_id = $2 AND available >= $3
        "#,
    )
    .bind(sku_id)
    .bind(warehouse_id)
    .bind(quantity)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    insert_movement(
        &mut tx,
        sku_id,
        warehouse_id,
        -quantity,
        MovementType::Sale,
        Some(order_id),
        None,
        None,
        now,
    )
    .await?;
    tx.commit().await?;
    Ok(true)
}

pub async fn release(
    pool: &PgPool,
    sku_id: i64,
    warehouse_id: i64,
    quantity: i32,
    order_id: i64,
    now: i64,
) -> StoreResult<()> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        r#"
        UPDATE stock_info
        SET available = available + $3, reserved = GREATEST(reserved - $3, 0)
        WHERE sku_id = $1 AND warehouse_id = $2
        "#,
    )
    .bind(sku_id)
    .bind(warehouse_id)
    .bind(quantity)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Err(StoreError::Integrity(format!(
            "no stock row for sku {sku_id} at warehouse {warehouse_id}"
        )));
    }

    insert_movement(
        &mut tx,
        sku_id,
        warehouse_id,
        quantity,
        MovementType::Return,
        Some(order_id),
        None,
        None,
        now,
    )
    .await?;
    tx.commit().await?;
    Ok(())
}

pub async fn deduct(
    pool: &PgPool,
    sku_id: i64,
    warehouse_id: i64,
    quantity: i32,
) -> StoreResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE stock_info
        SET reserved = GREATEST(reserved - $3, 0)
        WHERE sku_id = $1 AND warehouse_id = $2
        "#,
    )
    .bind(sku_id)
    .bind(warehouse_id)
    .bind(quantity)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::Integrity(format!(
            "no stock row for sku {sku_id} at warehouse {warehouse_id}"
        )));
    }
    Ok(())
}

pub async fn adjust(
    pool: &PgPool,
    sku_id: i64,
    warehouse_id: i64,
    delta: i32,
    reason: &str,
    created_by: Option<&str>,
    now: i64,
) -> StoreResult<i32> {
    let mut tx = pool.begin().await?;
    // The clamp can shrink the applied delta, so compute it against the
    // locked pre-update value.
    let applied: Option<(i32,)> = sqlx::query_as(
        r#"
        WITH prev AS (
            SELECT available FROM stock_info
            WHERE sku_id = $1 AND warehouse_id = $2
            FOR UPDATE
        )
        UPDATE stock_info
        SET available = GREATEST(stock_info.available + $3, 0)
        FROM prev
        WHERE sku_id = $1 AND warehouse_id = $2
        RETURNING stock_info.available - prev.available
        "#,
    )
    .bind(sku_id)
    .bind(warehouse_id)
    .bind(delta)
    .fetch_optional(&mut *tx)
    .await?;

    let Some((applied,)) = applied else {
        tx.rollback().await?;
        return Err(StoreError::Integrity(format!(
            "no stock row for sku {sku_id} at warehouse {warehouse_id}"
        )));
    };

    if applied != 0 {
        insert_movement(
            &mut tx,
            sku_id,
            warehouse_id,
            applied,
            MovementType::Adjustment,
            None,
            Some(reason),
            created_by,
            now,
        )
        .await?;
    }
    tx.commit().await?;
    Ok(applied)
}

pub async fn transfer(
    pool: &PgPool,
    sku_id: i64,
    from_warehouse_id: i64,
    to_warehouse_id: i64,
    quantity: i32,
    reason: &str,
    created_by: Option<&str>,
    now: i64,
) -> StoreResult<bool> {
    let mut tx = pool.begin().await?;
    let source: Option<(i32,)> = sqlx::query_as(
        r#"
        UPDATE stock_info
        SET available = available - $3
        WHERE sku_id = $1 AND warehouse_id = $2 AND available >= $3
        RETURNING alert_threshold
        "#,
    )
    .bind(sku_id)
    .bind(from_warehouse_id)
    .bind(quantity)
    .fetch_optional(&mut *tx)
    .await?;

    let Some((alert_threshold,)) = source else {
        tx.rollback().await?;
        return Ok(false);
    };

    sqlx::query(
        r#"
        INSERT INTO stock_info (sku_id, warehouse_id, available, reserved, alert_threshold)
        VALUES ($1, $2, $3, 0, $4)
        ON CONFLICT (sku_id, warehouse_id) DO UPDATE SET
            available = stock_info.available + EXCLUDED.available
        "#,
    )
    .bind(sku_id)
    .bind(to_warehouse_id)
    .bind(quantity)
    .bind(alert_threshold)
    .execute(&mut *tx)
    .await?;

    insert_movement(
        &mut tx,
        sku_id,
        from_warehouse_id,
        -quantity,
        MovementType::Transfer,
        None,
        Some(&format!("{reason} (to warehouse {to_warehouse_id})")),
        created_by,
        now,
    )
    .await?;
    insert_movement(
        &mut tx,
        sku_id,
        to_warehouse_id,
        quantity,
        MovementType::Transfer,
        None,
        Some(&format!("{reason} (from warehouse {from_warehouse_id})")),
        created_by,
        now,
    )
    .await?;
    tx.commit().await?;
    Ok(true)
}

pub async fn movements(
    pool: &PgPool,
    sku_id: i64,
    limit: i64,
    offset: i64,
) -> StoreResult<Vec<StockMovement>> {
    let rows: Vec<MovementRow> = sqlx::query_as(
        r#"
        SELECT id, sku_id, warehouse_id, quantity, movement_type,
               reference_id, reason, created_by, created_at
        FROM stock_movements
        WHERE sku_id = $1
        ORDER BY created_at DESC, id DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(sku_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(MovementRow::into_movement).collect()
}

pub async fn low_stock(pool: &PgPool, warehouse_id: Option<i64>) -> StoreResult<Vec<StockInfo>> {
    let rows: Vec<StockRow> = sqlx::query_as(
        r#"
        SELECT sku_id, warehouse_id, available, reserved, alert_threshold
        FROM stock_info
        WHERE available <= alert_threshold
          AND ($1::bigint IS NULL OR warehouse_id = $1)
        ORDER BY sku_id, warehouse_id
        "#,
    )
    .bind(warehouse_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(StockInfo::from).collect())
}
