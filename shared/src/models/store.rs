//! Store Model

use serde::{Deserialize, Serialize};

/// Opening time used when a weekday has no operating-hours row
pub const DEFAULT_OPEN_TIME: &str = "09:00";
/// Closing time seeded for new stores
pub const DEFAULT_CLOSE_TIME: &str = "22:00";

/// Store entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Store {
    pub id: i64,
    pub name: String,
    /// IANA timezone name used for trading-day boundaries (e.g. "Asia/Seoul")
    #[serde(default = "default_timezone")]
    pub timezone: String,
    pub is_open: bool,
}

fn default_timezone() -> String {
    "Asia/Seoul".to_string()
}

/// Operating hours for one weekday (0 = Monday … 6 = Sunday)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OperatingHours {
    pub store_id: i64,
    pub weekday: i16,
    /// "HH:MM"
    pub open_time: String,
    /// "HH:MM"
    pub close_time: String,
    pub is_closed: bool,
}
