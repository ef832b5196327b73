//! Inventory Model

use serde::{Deserialize, Serialize};

/// Raw ingredient stock owned by a store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct InventoryItem {
    pub id: i64,
    pub store_id: i64,
    pub name: String,
    /// Never negative (enforced by a CHECK constraint)
    pub quantity: i64,
    pub unit: String,
    /// Low-stock warning threshold
    pub safe_quantity: i64,
}

/// How much of an inventory item one unit of a menu item consumes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RecipeLink {
    pub menu_id: i64,
    pub inventory_item_id: i64,
    pub amount_needed: i64,
}
