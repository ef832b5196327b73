//! Staff call endpoints

use axum::{
    Json,
    extract::{Path, State},
};
use shared::error::ApiResponse;
use shared::models::{StaffCall, StaffCallCreate};

use crate::services::staff_calls;
use crate::state::AppState;

use super::ApiResult;

/// POST /api/staff-calls
pub async fn create_staff_call(
    State(state): State<AppState>,
    Json(req): Json<StaffCallCreate>,
) -> ApiResult<StaffCall> {
    let call = staff_calls::create_staff_call(&state, req).await?;
    Ok(ApiResponse::success(call))
}

/// POST /api/staff-calls/{call_id}/complete
pub async fn complete_staff_call(
    State(state): State<AppState>,
    Path(call_id): Path<i64>,
) -> ApiResult<()> {
    staff_calls::complete_staff_call(&state.pool, call_id).await?;
    Ok(ApiResponse::ok())
}

/// GET /api/stores/{store_id}/staff-calls/open
pub async fn list_open_calls(
    State(state): State<AppState>,
    Path(store_id): Path<i64>,
) -> ApiResult<Vec<StaffCall>> {
    let calls = staff_calls::list_open_calls(&state.pool, store_id).await?;
    Ok(ApiResponse::success(calls))
}
