//! Order API Handlers

use axum::extract::{Path, State};
use axum::Json;

use shared::error::AppError;
use shared::models::order::{
    CheckoutRequest, OrderDetail, OrderStatus, ReleaseOutcome, ShipRequest,
};

use crate::db::OrderStore;
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, AppError>;

/// POST /api/orders - 创建订单（下单）
pub async fn checkout(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> ApiResult<OrderDetail> {
    let detail = state.checkout.create_order(payload).await?;
    Ok(Json(detail))
}

/// GET /api/orders/{id} - 订单详情（含物流时间线）
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<OrderDetail> {
    let order = state
        .store
        .get_order(id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::not_found(format!("order {id}")))?;
    let items = state.store.order_items(id).await.map_err(AppError::from)?;
    let tracking = state
        .store
        .order_tracking(id)
        .await
        .map_err(AppError::from)?;
    Ok(Json(OrderDetail {
        order,
        items,
        tracking,
    }))
}

/// POST /api/orders/{id}/cancel - 取消订单
///
/// Cancellation always succeeds once the edge is legal; per-item release
/// failures are returned for the back-office to reconcile, not surfaced as
/// an order failure.
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<ReleaseOutcome>> {
    let report = state
        .machine
        .transition(id, OrderStatus::Cancelled, None)
        .await?;
    Ok(Json(report.releases))
}

/// POST /api/orders/{id}/ship - 发货
pub async fn ship(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ShipRequest>,
) -> ApiResult<OrderDetail> {
    state
        .machine
        .transition(id, OrderStatus::Shipped, Some(&payload))
        .await?;
    get_order(State(state), Path(id)).await
}

/// POST /api/orders/{id}/deliver - 确认收货
pub async fn deliver(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<OrderDetail> {
    state
        .machine
        .transition(id, OrderStatus::Delivered, None)
        .await?;
    get_order(State(state), Path(id)).await
}
