//! Staff Call Model

use serde::{Deserialize, Serialize};

/// Diner request for staff attention
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StaffCall {
    pub id: i64,
    pub store_id: i64,
    pub table_id: i64,
    pub message: String,
    pub is_completed: bool,
    pub created_at: i64,
}

/// Create staff call payload (the table token is the diner's credential)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffCallCreate {
    pub table_token: String,
    pub message: String,
}
