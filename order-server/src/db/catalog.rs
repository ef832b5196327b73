//! Read-only catalog lookups: stores, operating hours, tables, menus, options
//!
//! Catalog editing lives elsewhere; the order pipeline only reads.

use shared::models::{
    DEFAULT_CLOSE_TIME, DEFAULT_OPEN_TIME, DiningTable, Menu, MenuOption, OperatingHours, Store,
};
use sqlx::{Executor, PgPool, Postgres};

pub async fn get_store(
    conn: impl Executor<'_, Database = Postgres>,
    store_id: i64,
) -> Result<Option<Store>, sqlx::Error> {
    sqlx::query_as("SELECT id, name, timezone, is_open FROM stores WHERE id = $1")
        .bind(store_id)
        .fetch_optional(conn)
        .await
}

/// Lock the store row for the rest of the transaction.
///
/// Every order creation for a store goes through this lock, which serializes
/// daily numbering per store.
pub async fn lock_store(
    conn: impl Executor<'_, Database = Postgres>,
    store_id: i64,
) -> Result<Option<Store>, sqlx::Error> {
    sqlx::query_as("SELECT id, name, timezone, is_open FROM stores WHERE id = $1 FOR UPDATE")
        .bind(store_id)
        .fetch_optional(conn)
        .await
}

/// Operating hours row for a weekday (0 = Monday)
pub async fn get_operating_hours(
    conn: impl Executor<'_, Database = Postgres>,
    store_id: i64,
    weekday: i16,
) -> Result<Option<OperatingHours>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT store_id, weekday, open_time, close_time, is_closed
        FROM store_operating_hours
        WHERE store_id = $1 AND weekday = $2
        "#,
    )
    .bind(store_id)
    .bind(weekday)
    .fetch_optional(conn)
    .await
}

/// Insert default hours for every weekday that has none. Existing rows are kept.
pub async fn seed_default_hours(pool: &PgPool, store_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO store_operating_hours (store_id, weekday, open_time, close_time, is_closed)
        SELECT $1, d, $2, $3, FALSE
        FROM generate_series(0, 6) AS d
        ON CONFLICT (store_id, weekday) DO NOTHING
        "#,
    )
    .bind(store_id)
    .bind(DEFAULT_OPEN_TIME)
    .bind(DEFAULT_CLOSE_TIME)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Resolve a table from its QR token
pub async fn find_table_by_token(
    conn: impl Executor<'_, Database = Postgres>,
    token: &str,
) -> Result<Option<DiningTable>, sqlx::Error> {
    sqlx::query_as("SELECT id, store_id, name, qr_token FROM store_tables WHERE qr_token = $1")
        .bind(token)
        .fetch_optional(conn)
        .await
}

/// Menus of a store among `menu_ids`. Ids of other stores are not returned.
pub async fn menus_by_ids(
    conn: impl Executor<'_, Database = Postgres>,
    store_id: i64,
    menu_ids: &[i64],
) -> Result<Vec<Menu>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT id, store_id, name, price, is_sold_out
        FROM menus
        WHERE store_id = $1 AND id = ANY($2)
        "#,
    )
    .bind(store_id)
    .bind(menu_ids)
    .fetch_all(conn)
    .await
}

/// Options among `option_ids`, with the menu that owns each option group
pub async fn options_by_ids(
    conn: impl Executor<'_, Database = Postgres>,
    option_ids: &[i64],
) -> Result<Vec<MenuOption>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT o.id, o.group_id, g.menu_id, o.name, o.price
        FROM options o
        JOIN option_groups g ON g.id = o.group_id
        WHERE o.id = ANY($1)
        "#,
    )
    .bind(option_ids)
    .fetch_all(conn)
    .await
}
