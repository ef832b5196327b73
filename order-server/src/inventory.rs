//! Inventory ledger
//!
//! Two phases inside the order transaction:
//! 1. check: total up recipe requirements per ingredient, lock those rows,
//!    fail the whole order on the first shortfall
//! 2. deduct: subtract every requirement
//!
//! Menus without recipe links never touch inventory.

use std::collections::{BTreeMap, HashMap};

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{InventoryItem, RecipeLink};
use sqlx::PgConnection;

use crate::db;
use crate::error::ServiceResult;

/// Required amount per inventory item id, ordered by id (lock order)
pub type Requirements = BTreeMap<i64, i64>;

/// Accumulate `amount_needed * quantity` per ingredient across all lines
pub fn plan_requirements(lines: &[(i64, i32)], links: &[RecipeLink]) -> AppResult<Requirements> {
    let mut by_menu: HashMap<i64, Vec<&RecipeLink>> = HashMap::new();
    for link in links {
        by_menu.entry(link.menu_id).or_default().push(link);
    }

    let mut required = Requirements::new();
    for &(menu_id, quantity) in lines {
        let Some(recipe) = by_menu.get(&menu_id) else {
            continue;
        };
        for link in recipe {
            let need = link
                .amount_needed
                .checked_mul(i64::from(quantity))
                .and_then(|n| {
                    n.checked_add(required.get(&link.inventory_item_id).copied().unwrap_or(0))
                })
                .ok_or_else(|| AppError::new(ErrorCode::ValueOutOfRange))?;
            required.insert(link.inventory_item_id, need);
        }
    }
    Ok(required)
}

/// Compare requirements against the locked stock rows.
///
/// The first short item (lowest id) is reported; nothing is deducted.
pub fn check_stock(required: &Requirements, stock: &HashMap<i64, InventoryItem>) -> AppResult<()> {
    for (&item_id, &need) in required {
        let item = stock.get(&item_id).ok_or_else(|| {
            AppError::internal(format!("Recipe references missing inventory item {item_id}"))
        })?;
        if item.quantity < need {
            return Err(AppError::insufficient_stock(&item.name, item.quantity, need)
                .with_detail("inventory_item_id", item_id));
        }
    }
    Ok(())
}

/// Check and deduct stock for the ordered lines within `conn`'s transaction.
///
/// Returns the deducted items with their new quantities.
pub async fn reserve_and_deduct(
    conn: &mut PgConnection,
    store_id: i64,
    lines: &[(i64, i32)],
) -> ServiceResult<Vec<InventoryItem>> {
    let menu_ids: Vec<i64> = lines.iter().map(|(id, _)| *id).collect();
    let links = db::inventory::recipe_links_for_menus(&mut *conn, &menu_ids).await?;
    let required = plan_requirements(lines, &links)?;
    if required.is_empty() {
        return Ok(Vec::new());
    }

    let item_ids: Vec<i64> = required.keys().copied().collect();
    let stock: HashMap<i64, InventoryItem> =
        db::inventory::lock_items(&mut *conn, store_id, &item_ids)
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

    check_stock(&required, &stock)?;

    let mut deducted = Vec::with_capacity(required.len());
    for (&item_id, &amount) in &required {
        let item = db::inventory::deduct(&mut *conn, item_id, amount).await?;
        if item.quantity <= item.safe_quantity {
            tracing::warn!(
                store_id,
                inventory_item_id = item.id,
                item_name = %item.name,
                quantity = item.quantity,
                safe_quantity = item.safe_quantity,
                "Inventory at or below safe quantity"
            );
        }
        deducted.push(item);
    }
    Ok(deducted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(menu_id: i64, item_id: i64, amount: i64) -> RecipeLink {
        RecipeLink {
            menu_id,
            inventory_item_id: item_id,
            amount_needed: amount,
        }
    }

    fn item(id: i64, name: &str, quantity: i64) -> InventoryItem {
        InventoryItem {
            id,
            store_id: 1,
            name: name.to_string(),
            quantity,
            unit: "ea".to_string(),
            safe_quantity: 0,
        }
    }

    #[test]
    fn shared_ingredient_accumulates() {
        // Ramen uses 2 eggs, Bibimbap 1 egg + 1 rice
        let links = [link(1, 100, 2), link(2, 100, 1), link(2, 101, 1)];
        let required = plan_requirements(&[(1, 5), (2, 2)], &links).unwrap();

        assert_eq!(required.get(&100), Some(&12));
        assert_eq!(required.get(&101), Some(&2));
    }

    #[test]
    fn unlinked_menu_needs_nothing() {
        let links = [link(1, 100, 2)];
        let required = plan_requirements(&[(3, 10)], &links).unwrap();
        assert!(required.is_empty());
    }

    #[test]
    fn shortfall_names_the_item() {
        let links = [link(1, 100, 2), link(2, 100, 1)];
        let required = plan_requirements(&[(1, 5), (2, 2)], &links).unwrap();
        let stock = HashMap::from([(100, item(100, "Egg", 10))]);

        let err = check_stock(&required, &stock).unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        let details = err.details.unwrap();
        assert_eq!(details.get("item_name").unwrap(), "Egg");
        assert_eq!(details.get("have").unwrap(), 10);
        assert_eq!(details.get("need").unwrap(), 12);
    }

    #[test]
    fn exact_stock_passes() {
        let required = Requirements::from([(100, 10)]);
        let stock = HashMap::from([(100, item(100, "Egg", 10))]);
        assert!(check_stock(&required, &stock).is_ok());
    }

    #[test]
    fn missing_stock_row_is_internal() {
        let required = Requirements::from([(100, 1)]);
        let err = check_stock(&required, &HashMap::new()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InternalError);
    }
}
