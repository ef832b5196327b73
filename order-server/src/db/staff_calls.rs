//! Staff call persistence

use shared::models::StaffCall;
use sqlx::{Executor, Postgres};

pub async fn insert(
    conn: impl Executor<'_, Database = Postgres>,
    store_id: i64,
    table_id: i64,
    message: &str,
    now: i64,
) -> Result<StaffCall, sqlx::Error> {
    sqlx::query_as(
        r#"
        INSERT INTO staff_calls (store_id, table_id, message, is_completed, created_at)
        VALUES ($1, $2, $3, FALSE, $4)
        RETURNING id, store_id, table_id, message, is_completed, created_at
        "#,
    )
    .bind(store_id)
    .bind(table_id)
    .bind(message)
    .bind(now)
    .fetch_one(conn)
    .await
}

pub async fn find(
    conn: impl Executor<'_, Database = Postgres>,
    call_id: i64,
) -> Result<Option<StaffCall>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, store_id, table_id, message, is_completed, created_at FROM staff_calls WHERE id = $1",
    )
    .bind(call_id)
    .fetch_optional(conn)
    .await
}

/// Returns false if the call was already completed or does not exist
pub async fn mark_completed(
    conn: impl Executor<'_, Database = Postgres>,
    call_id: i64,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE staff_calls SET is_completed = TRUE WHERE id = $1 AND is_completed = FALSE")
            .bind(call_id)
            .execute(conn)
            .await?;
    Ok(result.rows_affected() > 0)
}

/// Open calls for a store, oldest first
pub async fn list_open(
    conn: impl Executor<'_, Database = Postgres>,
    store_id: i64,
) -> Result<Vec<StaffCall>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT id, store_id, table_id, message, is_completed, created_at
        FROM staff_calls
        WHERE store_id = $1 AND is_completed = FALSE
        ORDER BY created_at, id
        "#,
    )
    .bind(store_id)
    .fetch_all(conn)
    .await
}
