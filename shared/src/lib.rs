//! Shared types for the QR ordering backend
//!
//! Common types used by the order server and by store terminals including
//! error types, response structures, entity models and the realtime protocol.

pub mod error;
pub mod models;
pub mod terminal;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use terminal::TerminalEvent;
