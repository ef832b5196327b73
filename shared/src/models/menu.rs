//! Menu Model
//!
//! Read-only view of the menu catalog. Prices are integers in the minor
//! currency unit.

use serde::{Deserialize, Serialize};

/// Menu item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Menu {
    pub id: i64,
    pub store_id: i64,
    pub name: String,
    pub price: i64,
    pub is_sold_out: bool,
}

/// Option belonging to one of a menu item's option groups
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MenuOption {
    pub id: i64,
    pub group_id: i64,
    /// Menu that owns the option group
    pub menu_id: i64,
    pub name: String,
    /// Price delta added to the menu base price
    pub price: i64,
}
