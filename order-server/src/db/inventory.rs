//! Inventory rows and recipe links

use shared::models::{InventoryItem, RecipeLink};
use sqlx::{Executor, Postgres};

pub async fn recipe_links_for_menus(
    conn: impl Executor<'_, Database = Postgres>,
    menu_ids: &[i64],
) -> Result<Vec<RecipeLink>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT menu_id, inventory_item_id, amount_needed
        FROM recipe_links
        WHERE menu_id = ANY($1)
        "#,
    )
    .bind(menu_ids)
    .fetch_all(conn)
    .await
}

/// Lock the store's inventory rows in id order (`FOR UPDATE`).
///
/// Consistent ordering keeps two orders sharing ingredients from deadlocking.
pub async fn lock_items(
    conn: impl Executor<'_, Database = Postgres>,
    store_id: i64,
    item_ids: &[i64],
) -> Result<Vec<InventoryItem>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT id, store_id, name, quantity, unit, safe_quantity
        FROM inventory_items
        WHERE store_id = $1 AND id = ANY($2)
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .bind(store_id)
    .bind(item_ids)
    .fetch_all(conn)
    .await
}

/// Subtract `amount` and return the updated row
pub async fn deduct(
    conn: impl Executor<'_, Database = Postgres>,
    item_id: i64,
    amount: i64,
) -> Result<InventoryItem, sqlx::Error> {
    sqlx::query_as(
        r#"
        UPDATE inventory_items
        SET quantity = quantity - $2
        WHERE id = $1
        RETURNING id, store_id, name, quantity, unit, safe_quantity
        "#,
    )
    .bind(item_id)
    .bind(amount)
    .fetch_one(conn)
    .await
}

pub async fn list_for_store(
    conn: impl Executor<'_, Database = Postgres>,
    store_id: i64,
) -> Result<Vec<InventoryItem>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT id, store_id, name, quantity, unit, safe_quantity
        FROM inventory_items
        WHERE store_id = $1
        ORDER BY id
        "#,
    )
    .bind(store_id)
    .fetch_all(conn)
    .await
}
