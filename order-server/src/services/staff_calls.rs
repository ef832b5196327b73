//! Staff calls: persisted, then pushed to the store's terminals

use shared::TerminalEvent;
use shared::error::{AppError, ErrorCode};
use shared::models::{StaffCall, StaffCallCreate};
use sqlx::PgPool;

use crate::db;
use crate::error::ServiceResult;
use crate::state::AppState;

const MAX_MESSAGE_CHARS: usize = 200;

/// Trimmed, non-empty, bounded message
pub fn normalize_message(message: &str) -> Result<String, AppError> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("message must not be empty"));
    }
    if trimmed.chars().count() > MAX_MESSAGE_CHARS {
        return Err(
            AppError::validation(format!("message exceeds {MAX_MESSAGE_CHARS} characters"))
                .with_detail("max", MAX_MESSAGE_CHARS),
        );
    }
    Ok(trimmed.to_string())
}

pub async fn create_staff_call(state: &AppState, req: StaffCallCreate) -> ServiceResult<StaffCall> {
    let message = normalize_message(&req.message)?;
    let table = db::catalog::find_table_by_token(&state.pool, &req.table_token)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::TableNotFound))?;

    let call = db::staff_calls::insert(
        &state.pool,
        table.store_id,
        table.id,
        &message,
        shared::util::now_millis(),
    )
    .await?;

    tracing::info!(store_id = call.store_id, call_id = call.id, table = %table.name, "Staff call created");

    let event = TerminalEvent::StaffCall {
        call_id: call.id,
        table_name: table.name,
        message: call.message.clone(),
        created_at: call.created_at,
    };
    state.hub.broadcast(call.store_id, &event);

    Ok(call)
}

pub async fn complete_staff_call(pool: &PgPool, call_id: i64) -> ServiceResult<()> {
    let call = db::staff_calls::find(pool, call_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::StaffCallNotFound).with_detail("call_id", call_id))?;
    if call.is_completed || !db::staff_calls::mark_completed(pool, call_id).await? {
        return Err(AppError::new(ErrorCode::StaffCallAlreadyCompleted)
            .with_detail("call_id", call_id)
            .into());
    }
    tracing::info!(store_id = call.store_id, call_id, "Staff call completed");
    Ok(())
}

/// Open calls for a store, oldest first
pub async fn list_open_calls(pool: &PgPool, store_id: i64) -> ServiceResult<Vec<StaffCall>> {
    db::catalog::get_store(pool, store_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::StoreNotFound).with_detail("store_id", store_id))?;
    Ok(db::staff_calls::list_open(pool, store_id).await?)
}
