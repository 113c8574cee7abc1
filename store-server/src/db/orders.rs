//! Order, order item and tracking queries

use sqlx::PgPool;

use shared::models::order::{Order, OrderItem, OrderStatus, OrderTracking};

use super::{StoreError, StoreResult};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    status: String,
    total_amount: rust_decimal::Decimal,
    shipping_address: String,
    created_at: i64,
    paid_at: Option<i64>,
    shipped_at: Option<i64>,
    delivered_at: Option<i64>,
    cancelled_at: Option<i64>,
}

impl OrderRow {
    fn into_order(self) -> StoreResult<Order> {
        let status = self
            .status
            .parse::<OrderStatus>()
            .map_err(StoreError::Integrity)?;
        Ok(Order {
            id: self.id,
            status,
            total_amount: self.total_amount,
            shipping_address: self.shipping_address,
            created_at: self.created_at,
            paid_at: self.paid_at,
            shipped_at: self.shipped_at,
            delivered_at: self.delivered_at,
            cancelled_at: self.cancelled_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: i64,
    order_id: i64,
    sku_id: i64,
    warehouse_id: i64,
    product_name: String,
    product_image: String,
    unit_price: rust_decimal::Decimal,
    quantity: i32,
    size: Option<String>,
    color: Option<String>,
}

impl From<ItemRow> for OrderItem {
    fn from(r: ItemRow) -> Self {
        OrderItem {
            id: r.id,
            order_id: r.order_id,
            sku_id: r.sku_id,
            warehouse_id: r.warehouse_id,
            product_name: r.product_name,
            product_image: r.product_image,
            unit_price: r.unit_price,
            quantity: r.quantity,
            size: r.size,
            color: r.color,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TrackingRow {
    id: i64,
    order_id: i64,
    status: String,
    description: String,
    carrier: Option<String>,
    tracking_number: Option<String>,
    created_at: i64,
}

impl TrackingRow {
    fn into_tracking(self) -> StoreResult<OrderTracking> {
        let status = self
            .status
            .parse::<OrderStatus>()
            .map_err(StoreError::Integrity)?;
        Ok(OrderTracking {
            id: self.id,
            order_id: self.order_id,
            status,
            description: self.description,
            carrier: self.carrier,
            tracking_number: self.tracking_number,
            created_at: self.created_at,
        })
    }
}

async fn insert_tracking(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    tracking: &OrderTracking,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO order_tracking
            (id, order_id, status, description, carrier, tracking_number, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(tracking.id)
    .bind(tracking.order_id)
    .bind(tracking.status.as_str())
    .bind(&tracking.description)
    .bind(&tracking.carrier)
    .bind(&tracking.tracking_number)
    .bind(tracking.created_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn create_order(
    pool: &PgPool,
    order: &Order,
    items: &[OrderItem],
    tracking: &OrderTracking,
) -> StoreResult<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO orders
            (id, status, total_amount, shipping_address, created_at,
             paid_at, shipped_at, delivered_at, cancelled_at)
        VALUES ($1, $2, $3, $4, $5, NULL, NULL, NULL, NULL)
        "#,
    )
    .bind(order.id)
    .bind(order.status.as_str())
    .bind(order.total_amount)
    .bind(&order.shipping_address)
    .bind(order.created_at)
    .execute(&mut *tx)
    .await?;

    for item in items {
        sqlx::query(
            r#"
            INSERT INTO order_items
                (id, order_id, sku_id, warehouse_id, product_name, product_image,
                 unit_price, quantity, size, color)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(item.id)
        .bind(item.order_id)
        .bind(item.sku_id)
        .bind(item.warehouse_id)
        .bind(&item.product_name)
        .bind(&item.product_image)
        .bind(item.unit_price)
        .bind(item.quantity)
        .bind(&item.size)
        .bind(&item.color)
        .execute(&mut *tx)
        .await?;
    }

    insert_tracking(&mut tx, tracking).await?;
    tx.commit().await?;
    Ok(())
}

pub async fn get_order(pool: &PgPool, id: i64) -> StoreResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(
        r#"
        SELECT id, status, total_amount, shipping_address, created_at,
               paid_at, shipped_at, delivered_at, cancelled_at
        FROM orders WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.map(OrderRow::into_order).transpose()
}

pub async fn order_items(pool: &PgPool, order_id: i64) -> StoreResult<Vec<OrderItem>> {
    let rows: Vec<ItemRow> = sqlx::query_as(
        r#"
        SELECT id, order_id, sku_id, warehouse_id, product_name, product_image,
               unit_price, quantity, size, color
        FROM order_items WHERE order_id = $1 ORDER BY id
        "#,
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(OrderItem::from).collect())
}

pub async fn order_tracking(pool: &PgPool, order_id: i64) -> StoreResult<Vec<OrderTracking>> {
    let rows: Vec<TrackingRow> = sqlx::query_as(
        r#"
        SELECT id, order_id, status, description, carrier, tracking_number, created_at
        FROM order_tracking WHERE order_id = $1 ORDER BY created_at, id
        "#,
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(TrackingRow::into_tracking).collect()
}

/// Milestone timestamp column for a target status
fn milestone_column(status: OrderStatus) -> Option<&'static str> {
    match status {
        OrderStatus::Paid => Some("paid_at"),
        OrderStatus::Shipped => Some("shipped_at"),
        OrderStatus::Delivered => Some("delivered_at"),
        OrderStatus::Cancelled => Some("cancelled_at"),
        OrderStatus::Pending => None,
    }
}

pub async fn update_status(
    pool: &PgPool,
    order_id: i64,
    from: OrderStatus,
    to: OrderStatus,
    now: i64,
    tracking: &OrderTracking,
) -> StoreResult<bool> {
    // `pending` is never a transition target, every real target has a column
    let col = milestone_column(to).ok_or_else(|| {
        StoreError::Integrity(format!("status {to} is not a transition target"))
    })?;

    let mut tx = pool.begin().await?;

    // Guarded on the previous status: of two racing transitions only one
    // matches, the other sees rows_affected == 0 and writes nothing.
    let sql =
        format!("UPDATE orders SET status = $1, {col} = $2 WHERE id = $3 AND status = $4");
    let result = sqlx::query(&sql)
        .bind(to.as_str())
        .bind(now)
        .bind(order_id)
        .bind(from.as_str())
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    insert_tracking(&mut tx, tracking).await?;
    tx.commit().await?;
    Ok(true)
}
