//! Database access layer
//!
//! Free functions over `sqlx` executors. Functions that take
//! `impl Executor` work both on the pool and inside an open transaction
//! (`&mut *tx`). All timestamps are Unix millis.

pub mod catalog;
pub mod inventory;
pub mod orders;
pub mod staff_calls;
