//! Order endpoints

use axum::{
    Json,
    extract::{Path, State},
};
use shared::error::ApiResponse;
use shared::models::{Order, OrderCreate};

use crate::services::orders;
use crate::state::AppState;

use super::ApiResult;

/// POST /api/orders
pub async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<OrderCreate>,
) -> ApiResult<Order> {
    let order = orders::create_order(&state.pool, req).await?;
    Ok(ApiResponse::success(order))
}

/// GET /api/stores/{store_id}/orders/outstanding
pub async fn list_outstanding(
    State(state): State<AppState>,
    Path(store_id): Path<i64>,
) -> ApiResult<Vec<Order>> {
    let list = orders::list_outstanding(&state.pool, store_id).await?;
    Ok(ApiResponse::success(list))
}

/// POST /api/orders/{order_id}/complete
pub async fn complete_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> ApiResult<()> {
    orders::complete_order(&state.pool, order_id).await?;
    Ok(ApiResponse::ok())
}
