//! Stock API Handlers (merchant back-office)

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use shared::error::{AppError, ErrorCode};
use shared::models::stock::{
    StockAdjustRequest, StockInfo, StockLevel, StockMovement, StockTransferRequest,
};

use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, AppError>;

#[derive(Deserialize)]
pub struct WarehouseQuery {
    pub warehouse_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct MovementQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// GET /api/stock/{sku_id} - 库存查询（可按仓库过滤，默认聚合所有仓库）
pub async fn get_level(
    State(state): State<AppState>,
    Path(sku_id): Path<i64>,
    Query(query): Query<WarehouseQuery>,
) -> ApiResult<StockLevel> {
    let level = state
        .ledger
        .stock_level(sku_id, query.warehouse_id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::SkuNotFound, format!("no stock rows for SKU {sku_id}"))
        })?;
    Ok(Json(level))
}

/// POST /api/stock/adjust - 手动库存调整（入库/报损）
pub async fn adjust(
    State(state): State<AppState>,
    Json(payload): Json<StockAdjustRequest>,
) -> ApiResult<serde_json::Value> {
    let applied = state.ledger.adjust(&payload).await?;
    Ok(Json(serde_json::json!({
        "requested": payload.delta,
        "applied": applied,
    })))
}

/// POST /api/stock/transfer - 仓库间调拨
pub async fn transfer(
    State(state): State<AppState>,
    Json(payload): Json<StockTransferRequest>,
) -> ApiResult<serde_json::Value> {
    let moved = state.ledger.transfer(&payload).await?;
    if !moved {
        return Err(AppError::with_message(
            ErrorCode::OutOfStock,
            format!(
                "insufficient stock at warehouse {} for SKU {}",
                payload.from_warehouse_id, payload.sku_id
            ),
        ));
    }
    Ok(Json(serde_json::json!({ "moved": payload.quantity })))
}

/// GET /api/stock/alerts - 低库存告警（available <= alert_threshold）
pub async fn low_stock(
    State(state): State<AppState>,
    Query(query): Query<WarehouseQuery>,
) -> ApiResult<Vec<StockInfo>> {
    let rows = state.ledger.low_stock(query.warehouse_id).await?;
    Ok(Json(rows))
}

/// GET /api/stock/{sku_id}/movements - 库存流水（新到旧）
pub async fn movements(
    State(state): State<AppState>,
    Path(sku_id): Path<i64>,
    Query(query): Query<MovementQuery>,
) -> ApiResult<Vec<StockMovement>> {
    let rows = state
        .ledger
        .movements(sku_id, query.limit, query.offset)
        .await?;
    Ok(Json(rows))
}
