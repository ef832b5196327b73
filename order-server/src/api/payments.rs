//! Payment confirmation endpoint

use axum::{Json, extract::State};
use shared::error::ApiResponse;
use shared::models::{PaymentConfirm, PaymentConfirmation};

use crate::services::orders;
use crate::state::AppState;

use super::ApiResult;

/// POST /api/payments/confirm
///
/// `already_paid` is a success response: client retries and duplicate
/// callbacks land here.
pub async fn confirm_payment(
    State(state): State<AppState>,
    Json(req): Json<PaymentConfirm>,
) -> ApiResult<PaymentConfirmation> {
    let confirmation = orders::confirm_payment(&state, req).await?;
    Ok(ApiResponse::success(confirmation))
}
