//! Service layer: orchestration over db, pricing, inventory, payment and fanout

pub mod orders;
pub mod staff_calls;
