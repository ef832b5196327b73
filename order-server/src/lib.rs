//! order-server: QR table-ordering backend
//!
//! Diners order from a table's QR code, pay through PortOne, and the store's
//! kitchen terminals receive paid orders over WebSocket.
//!
//! Pipeline:
//! - `pricing`: server-side line and order totals
//! - `business_day`: daily order numbers that reset at opening time
//! - `inventory`: recipe-based stock check and deduction
//! - `payment`: gateway lookup and verification
//! - `live`: per-store terminal fanout
//! - `services`: orchestration of the above inside Postgres transactions

pub mod api;
pub mod business_day;
pub mod config;
pub mod db;
pub mod error;
pub mod inventory;
pub mod live;
pub mod payment;
pub mod pricing;
pub mod services;
pub mod state;
