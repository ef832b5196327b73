//! Order store: orders and their snapshotted items

use std::collections::HashMap;

use shared::models::{Order, OrderItemSnapshot, PaymentStatus};
use sqlx::{Executor, PgPool, Postgres};

use crate::business_day::TradingWindow;
use crate::error::is_unique_violation;

/// Unique index guarding against one receipt paying two orders
const IMP_UID_INDEX: &str = "idx_orders_imp_uid";
const MERCHANT_UID_INDEX: &str = "idx_orders_merchant_uid";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    store_id: i64,
    table_id: Option<i64>,
    table_name: Option<String>,
    daily_number: i32,
    total_price: i64,
    payment_status: String,
    imp_uid: Option<String>,
    merchant_uid: Option<String>,
    paid_amount: Option<i64>,
    paid_at: Option<i64>,
    is_completed: bool,
    created_at: i64,
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    order_id: i64,
    #[sqlx(flatten)]
    item: OrderItemSnapshot,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItemSnapshot>) -> Result<Order, sqlx::Error> {
        let payment_status = self
            .payment_status
            .parse::<PaymentStatus>()
            .map_err(|e| sqlx::Error::Decode(e.into()))?;
        Ok(Order {
            id: self.id,
            store_id: self.store_id,
            table_id: self.table_id,
            table_name: self.table_name,
            daily_number: self.daily_number,
            total_price: self.total_price,
            payment_status,
            imp_uid: self.imp_uid,
            merchant_uid: self.merchant_uid,
            paid_amount: self.paid_amount,
            paid_at: self.paid_at,
            is_completed: self.is_completed,
            created_at: self.created_at,
            items,
        })
    }
}

const ORDER_COLUMNS: &str = r#"
    o.id, o.store_id, o.table_id, t.name AS table_name, o.daily_number, o.total_price,
    o.payment_status, o.imp_uid, o.merchant_uid, o.paid_amount, o.paid_at,
    o.is_completed, o.created_at
"#;

/// New order header, inserted as PENDING
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub store_id: i64,
    pub table_id: Option<i64>,
    pub daily_number: i32,
    pub business_day_start: i64,
    pub total_price: i64,
    pub created_at: i64,
}

/// Outcome of the PENDING → PAID transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkPaid {
    /// This call performed the transition
    Updated,
    /// The order was no longer PENDING (a concurrent confirmation won)
    NotPending,
    /// The gateway reference is already attached to another order
    ReferenceInUse,
}

/// Highest daily number used by the store inside the window
pub async fn max_daily_number(
    conn: impl Executor<'_, Database = Postgres>,
    store_id: i64,
    window: TradingWindow,
) -> Result<Option<i32>, sqlx::Error> {
    let (max,): (Option<i32>,) = sqlx::query_as(
        r#"
        SELECT MAX(daily_number)
        FROM orders
        WHERE store_id = $1 AND created_at >= $2 AND created_at < $3
        "#,
    )
    .bind(store_id)
    .bind(window.start)
    .bind(window.end)
    .fetch_one(conn)
    .await?;
    Ok(max)
}

pub async fn insert_order(
    conn: impl Executor<'_, Database = Postgres>,
    order: &NewOrder,
) -> Result<i64, sqlx::Error> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO orders (
            store_id, table_id, daily_number, business_day_start, total_price,
            payment_status, is_completed, created_at
        )
        VALUES ($1, $2, $3, $4, $5, 'PENDING', FALSE, $6)
        RETURNING id
        "#,
    )
    .bind(order.store_id)
    .bind(order.table_id)
    .bind(order.daily_number)
    .bind(order.business_day_start)
    .bind(order.total_price)
    .bind(order.created_at)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

/// Batch insert snapshotted items (single UNNEST round-trip)
pub async fn insert_items(
    conn: impl Executor<'_, Database = Postgres>,
    order_id: i64,
    items: &[OrderItemSnapshot],
) -> Result<(), sqlx::Error> {
    if items.is_empty() {
        return Ok(());
    }
    let order_ids: Vec<i64> = items.iter().map(|_| order_id).collect();
    let menu_ids: Vec<Option<i64>> = items.iter().map(|i| i.menu_id).collect();
    let names: Vec<&str> = items.iter().map(|i| i.menu_name.as_str()).collect();
    let unit_prices: Vec<i64> = items.iter().map(|i| i.unit_price).collect();
    let quantities: Vec<i32> = items.iter().map(|i| i.quantity).collect();
    let line_totals: Vec<i64> = items.iter().map(|i| i.line_total).collect();
    let options: Vec<Option<&str>> = items.iter().map(|i| i.options_desc.as_deref()).collect();

    sqlx::query(
        r#"
        INSERT INTO order_items (
            order_id, menu_id, menu_name, unit_price, quantity, line_total, options_desc
        )
        SELECT * FROM UNNEST(
            $1::BIGINT[], $2::BIGINT[], $3::TEXT[], $4::BIGINT[],
            $5::INTEGER[], $6::BIGINT[], $7::TEXT[]
        )
        "#,
    )
    .bind(&order_ids)
    .bind(&menu_ids)
    .bind(&names)
    .bind(&unit_prices)
    .bind(&quantities)
    .bind(&line_totals)
    .bind(&options)
    .execute(conn)
    .await?;
    Ok(())
}

async fn items_for_orders(
    pool: &PgPool,
    order_ids: &[i64],
) -> Result<HashMap<i64, Vec<OrderItemSnapshot>>, sqlx::Error> {
    let rows: Vec<ItemRow> = sqlx::query_as(
        r#"
        SELECT order_id, menu_id, menu_name, unit_price, quantity, line_total, options_desc
        FROM order_items
        WHERE order_id = ANY($1)
        ORDER BY id
        "#,
    )
    .bind(order_ids)
    .fetch_all(pool)
    .await?;

    let mut by_order: HashMap<i64, Vec<OrderItemSnapshot>> = HashMap::new();
    for row in rows {
        by_order.entry(row.order_id).or_default().push(row.item);
    }
    Ok(by_order)
}

/// Full order detail (header, table name, items)
pub async fn get_order(pool: &PgPool, order_id: i64) -> Result<Option<Order>, sqlx::Error> {
    let row: Option<OrderRow> = sqlx::query_as(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders o LEFT JOIN store_tables t ON t.id = o.table_id WHERE o.id = $1"
    ))
    .bind(order_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let items = items_for_orders(pool, &[order_id])
        .await?
        .remove(&order_id)
        .unwrap_or_default();
    row.into_order(items).map(Some)
}

/// Paid orders the kitchen has not completed yet, oldest first
pub async fn list_outstanding(pool: &PgPool, store_id: i64) -> Result<Vec<Order>, sqlx::Error> {
    let rows: Vec<OrderRow> = sqlx::query_as(&format!(
        r#"
        SELECT {ORDER_COLUMNS}
        FROM orders o
        LEFT JOIN store_tables t ON t.id = o.table_id
        WHERE o.store_id = $1 AND o.payment_status = 'PAID' AND o.is_completed = FALSE
        ORDER BY o.created_at, o.id
        "#
    ))
    .bind(store_id)
    .fetch_all(pool)
    .await?;

    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut items = items_for_orders(pool, &ids).await?;
    rows.into_iter()
        .map(|row| {
            let order_items = items.remove(&row.id).unwrap_or_default();
            row.into_order(order_items)
        })
        .collect()
}

/// Single commit point of payment confirmation.
///
/// Guarded on `payment_status = 'PENDING'`, so concurrent confirmations
/// of the same order perform the transition at most once.
pub async fn mark_paid(
    conn: impl Executor<'_, Database = Postgres>,
    order_id: i64,
    imp_uid: &str,
    merchant_uid: &str,
    paid_amount: i64,
    paid_at: i64,
) -> Result<MarkPaid, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE orders
        SET payment_status = 'PAID', imp_uid = $2, merchant_uid = $3,
            paid_amount = $4, paid_at = $5
        WHERE id = $1 AND payment_status = 'PENDING'
        "#,
    )
    .bind(order_id)
    .bind(imp_uid)
    .bind(merchant_uid)
    .bind(paid_amount)
    .bind(paid_at)
    .execute(conn)
    .await;

    match result {
        Ok(r) if r.rows_affected() == 0 => Ok(MarkPaid::NotPending),
        Ok(_) => Ok(MarkPaid::Updated),
        Err(e)
            if is_unique_violation(&e, IMP_UID_INDEX)
                || is_unique_violation(&e, MERCHANT_UID_INDEX) =>
        {
            Ok(MarkPaid::ReferenceInUse)
        }
        Err(e) => Err(e),
    }
}

/// Set the kitchen-done flag. Returns false if the order was already completed
/// or does not exist.
pub async fn mark_completed(
    conn: impl Executor<'_, Database = Postgres>,
    order_id: i64,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE orders SET is_completed = TRUE, completed_at = $2
        WHERE id = $1 AND is_completed = FALSE
        "#,
    )
    .bind(order_id)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// `Some(is_completed)` if the order exists
pub async fn completion_state(
    conn: impl Executor<'_, Database = Postgres>,
    order_id: i64,
) -> Result<Option<bool>, sqlx::Error> {
    let row: Option<(bool,)> = sqlx::query_as("SELECT is_completed FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(|(done,)| done))
}
