//! SKU API Handlers (merchant back-office)

use axum::extract::{Path, State};
use axum::Json;

use shared::error::{AppError, ErrorCode};
use shared::models::sku::{ResolveRequest, Sku, SkuCreate};

use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, AppError>;

/// POST /api/skus - 创建 SKU（自动生成编码并初始化库存行）
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<SkuCreate>,
) -> ApiResult<Sku> {
    let sku = state.skus.create_sku(payload).await?;
    Ok(Json(sku))
}

/// POST /api/skus/resolve - 变体解析（商品 + 属性 → SKU）
///
/// `404` here means "cannot sell this configuration", not a stock-out.
pub async fn resolve(
    State(state): State<AppState>,
    Json(payload): Json<ResolveRequest>,
) -> ApiResult<Sku> {
    let sku = state
        .resolver
        .resolve(payload.product_id, &payload.attributes)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::VariantNotSellable,
                format!(
                    "product {} has no active SKU for the selected attributes",
                    payload.product_id
                ),
            )
        })?;
    Ok(Json(sku))
}

/// DELETE /api/skus/{id} - 停用 SKU（软删除）
pub async fn deactivate(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    let found = state.skus.deactivate_sku(id).await?;
    if !found {
        return Err(AppError::with_message(
            ErrorCode::SkuNotFound,
            format!("SKU {id} not found"),
        ));
    }
    Ok(Json(()))
}
