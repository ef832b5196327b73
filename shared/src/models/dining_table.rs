//! Dining Table Model

use serde::{Deserialize, Serialize};

/// Dining table entity (one per physical QR code)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DiningTable {
    pub id: i64,
    pub store_id: i64,
    pub name: String,
    /// Opaque credential printed in the table's QR code. Never echoed back.
    #[serde(skip_serializing, default)]
    pub qr_token: String,
}
