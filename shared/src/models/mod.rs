//! Data models
//!
//! Shared between the order server and store terminals (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (Postgres BIGSERIAL). Money is `i64` minor units.

pub mod dining_table;
pub mod inventory;
pub mod menu;
pub mod order;
pub mod staff_call;
pub mod store;

// Re-exports
pub use dining_table::*;
pub use inventory::*;
pub use menu::*;
pub use order::*;
pub use staff_call::*;
pub use store::*;
