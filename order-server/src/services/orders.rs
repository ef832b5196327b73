//! Order orchestration: create, confirm payment, complete
//!
//! CreateOrder runs pricing, numbering, inventory and persistence in one
//! transaction that holds the store row lock. ConfirmPayment verifies against
//! the gateway first and then commits with a single guarded UPDATE; the
//! terminal broadcast happens after that commit and never undoes it.

use chrono::Utc;
use shared::TerminalEvent;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    ConfirmStatus, DiningTable, Order, OrderCreate, PaymentConfirm, PaymentConfirmation,
    PaymentStatus,
};
use sqlx::PgPool;
use std::collections::HashMap;

use crate::business_day;
use crate::db;
use crate::db::orders::{MarkPaid, NewOrder};
use crate::error::ServiceResult;
use crate::inventory;
use crate::payment::{check_gateway_payment, parse_merchant_uid};
use crate::pricing;
use crate::state::AppState;

/// Check that the QR token grants access to the requested store/table.
///
/// `table_id` without a token is rejected. A token without `table_id` resolves
/// to the token's table.
pub fn authorize_table(
    store_id: i64,
    table_id: Option<i64>,
    token_table: Option<DiningTable>,
    token_supplied: bool,
) -> Result<Option<DiningTable>, AppError> {
    let not_found = || AppError::new(ErrorCode::TableNotFound).with_detail("store_id", store_id);

    match (table_id, token_table) {
        (None, None) if !token_supplied => Ok(None),
        (_, None) => Err(not_found()),
        (requested, Some(table)) => {
            if table.store_id != store_id || requested.is_some_and(|id| id != table.id) {
                return Err(not_found());
            }
            Ok(Some(table))
        }
    }
}

/// Price, number, reserve stock and persist a new PENDING order
pub async fn create_order(pool: &PgPool, req: OrderCreate) -> ServiceResult<Order> {
    let token_table = match req.table_token.as_deref() {
        Some(token) => db::catalog::find_table_by_token(pool, token).await?,
        None => None,
    };
    let table = authorize_table(
        req.store_id,
        req.table_id,
        token_table,
        req.table_token.is_some(),
    )?;

    let mut tx = pool.begin().await?;

    let store = db::catalog::lock_store(&mut *tx, req.store_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::StoreNotFound).with_detail("store_id", req.store_id))?;
    if !store.is_open {
        return Err(AppError::new(ErrorCode::StoreClosed)
            .with_detail("store_id", store.id)
            .into());
    }

    let mut menu_ids: Vec<i64> = req.items.iter().map(|l| l.menu_id).collect();
    menu_ids.sort_unstable();
    menu_ids.dedup();
    let option_ids: Vec<i64> = req
        .items
        .iter()
        .flat_map(|l| l.option_ids.iter().copied())
        .collect();

    let menus: HashMap<_, _> = db::catalog::menus_by_ids(&mut *tx, store.id, &menu_ids)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();
    let options: HashMap<_, _> = if option_ids.is_empty() {
        HashMap::new()
    } else {
        db::catalog::options_by_ids(&mut *tx, &option_ids)
            .await?
            .into_iter()
            .map(|o| (o.id, o))
            .collect()
    };

    let quote = pricing::quote_order(&req.items, &menus, &options)?;

    let now = Utc::now();
    let (window, daily_number) = business_day::next_daily_number(&mut *tx, &store, now).await?;

    inventory::reserve_and_deduct(&mut *tx, store.id, &quote.menu_quantities()).await?;

    let new_order = NewOrder {
        store_id: store.id,
        table_id: table.as_ref().map(|t| t.id),
        daily_number,
        business_day_start: window.start,
        total_price: quote.total,
        created_at: now.timestamp_millis(),
    };
    let order_id = db::orders::insert_order(&mut *tx, &new_order).await?;
    let items = quote.items();
    db::orders::insert_items(&mut *tx, order_id, &items).await?;

    tx.commit().await?;

    tracing::info!(
        store_id = store.id,
        order_id,
        daily_number,
        total_price = quote.total,
        skipped = quote.skipped_menu_ids.len(),
        "Order created"
    );

    Ok(Order {
        id: order_id,
        store_id: store.id,
        table_id: new_order.table_id,
        table_name: table.map(|t| t.name),
        daily_number,
        total_price: quote.total,
        payment_status: PaymentStatus::Pending,
        imp_uid: None,
        merchant_uid: None,
        paid_amount: None,
        paid_at: None,
        is_completed: false,
        created_at: new_order.created_at,
        items,
    })
}

fn already_paid(order: &Order) -> PaymentConfirmation {
    PaymentConfirmation {
        status: ConfirmStatus::AlreadyPaid,
        order_id: order.id,
        daily_number: order.daily_number,
    }
}

/// Verify a payment with the gateway and move the order to PAID.
///
/// Idempotent: confirming an order that is already PAID returns
/// `already_paid` without contacting the gateway.
pub async fn confirm_payment(
    state: &AppState,
    req: PaymentConfirm,
) -> ServiceResult<PaymentConfirmation> {
    let order_id = parse_merchant_uid(&req.merchant_uid)?;

    let order = db::orders::get_order(&state.pool, order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).with_detail("order_id", order_id))?;
    if order.payment_status == PaymentStatus::Paid {
        tracing::info!(order_id, "Payment already confirmed");
        return Ok(already_paid(&order));
    }

    let payment = state
        .reconciler
        .lookup(&req.imp_uid, &req.merchant_uid)
        .await?;
    if let Err(e) = check_gateway_payment(order.id, order.total_price, &req.merchant_uid, &payment) {
        tracing::warn!(
            order_id,
            imp_uid = %payment.imp_uid,
            code = %e.code,
            "Gateway payment rejected"
        );
        return Err(e.into());
    }

    let outcome = db::orders::mark_paid(
        &state.pool,
        order.id,
        &payment.imp_uid,
        &req.merchant_uid,
        payment.amount,
        shared::util::now_millis(),
    )
    .await?;

    match outcome {
        MarkPaid::Updated => {}
        MarkPaid::NotPending => {
            let current = db::orders::get_order(&state.pool, order.id)
                .await?
                .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
            if current.payment_status != PaymentStatus::Paid {
                return Err(AppError::internal("Order left PENDING without update").into());
            }
            tracing::info!(order_id, "Concurrent confirmation already marked order paid");
            return Ok(already_paid(&current));
        }
        MarkPaid::ReferenceInUse => {
            tracing::warn!(order_id, imp_uid = %payment.imp_uid, "Payment reference already used");
            return Err(AppError::new(ErrorCode::PaymentAlreadyUsed)
                .with_detail("order_id", order_id)
                .into());
        }
    }

    tracing::info!(
        store_id = order.store_id,
        order_id,
        daily_number = order.daily_number,
        imp_uid = %payment.imp_uid,
        amount = payment.amount,
        "Order paid"
    );

    notify_new_order(state, order.id).await;

    Ok(PaymentConfirmation {
        status: ConfirmStatus::Success,
        order_id: order.id,
        daily_number: order.daily_number,
    })
}

/// Best-effort NEW_ORDER push after payment commit
async fn notify_new_order(state: &AppState, order_id: i64) {
    match db::orders::get_order(&state.pool, order_id).await {
        Ok(Some(order)) => {
            let delivered = state
                .hub
                .broadcast(order.store_id, &TerminalEvent::new_order(&order));
            tracing::debug!(store_id = order.store_id, order_id, delivered, "NEW_ORDER fanout");
        }
        Ok(None) => tracing::warn!(order_id, "Paid order vanished before fanout"),
        Err(e) => tracing::warn!(order_id, error = %e, "Failed to load order for fanout"),
    }
}

/// Paid orders not yet completed by the kitchen
pub async fn list_outstanding(pool: &PgPool, store_id: i64) -> ServiceResult<Vec<Order>> {
    db::catalog::get_store(pool, store_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::StoreNotFound).with_detail("store_id", store_id))?;
    Ok(db::orders::list_outstanding(pool, store_id).await?)
}

/// Set the kitchen-done flag (once)
pub async fn complete_order(pool: &PgPool, order_id: i64) -> ServiceResult<()> {
    if db::orders::mark_completed(pool, order_id, shared::util::now_millis()).await? {
        tracing::info!(order_id, "Order completed");
        return Ok(());
    }
    match db::orders::completion_state(pool, order_id).await? {
        None => Err(AppError::new(ErrorCode::OrderNotFound)
            .with_detail("order_id", order_id)
            .into()),
        Some(_) => Err(AppError::new(ErrorCode::OrderAlreadyCompleted)
            .with_detail("order_id", order_id)
            .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(id: i64, store_id: i64) -> DiningTable {
        DiningTable {
            id,
            store_id,
            name: format!("Table {id}"),
            qr_token: "tok".to_string(),
        }
    }

    #[test]
    fn takeout_needs_no_table() {
        assert!(authorize_table(1, None, None, false).unwrap().is_none());
    }

    #[test]
    fn token_resolves_table() {
        let t = authorize_table(1, Some(3), Some(table(3, 1)), true).unwrap();
        assert_eq!(t.unwrap().id, 3);

        let t = authorize_table(1, None, Some(table(3, 1)), true).unwrap();
        assert_eq!(t.unwrap().name, "Table 3");
    }

    #[test]
    fn table_without_valid_token_is_rejected() {
        // table_id but no token
        let err = authorize_table(1, Some(3), None, false).unwrap_err();
        assert_eq!(err.code, ErrorCode::TableNotFound);
        // unknown token
        let err = authorize_table(1, None, None, true).unwrap_err();
        assert_eq!(err.code, ErrorCode::TableNotFound);
        // token of another table
        let err = authorize_table(1, Some(4), Some(table(3, 1)), true).unwrap_err();
        assert_eq!(err.code, ErrorCode::TableNotFound);
        // token of another store
        let err = authorize_table(1, Some(3), Some(table(3, 2)), true).unwrap_err();
        assert_eq!(err.code, ErrorCode::TableNotFound);
    }
}
