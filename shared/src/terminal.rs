//! Store terminal WebSocket protocol
//!
//! Server → Terminal: `TerminalEvent` (push only).
//! Terminal → Server: nothing meaningful; inbound frames are discarded.
//!
//! Delivery is fire-and-forget. A terminal that reconnects pulls outstanding
//! orders over HTTP instead of expecting a replay.

use serde::{Deserialize, Serialize};

use crate::models::{Order, OrderItemSnapshot};

/// Server → Terminal push message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TerminalEvent {
    /// A paid order the kitchen should start on
    NewOrder {
        order_id: i64,
        daily_number: i32,
        /// None for takeout orders
        table_name: Option<String>,
        items: Vec<OrderItemSnapshot>,
        total_price: i64,
        created_at: i64,
    },

    /// A diner asked for staff at their table
    StaffCall {
        call_id: i64,
        table_name: String,
        message: String,
        created_at: i64,
    },
}

impl TerminalEvent {
    /// Build the `NEW_ORDER` payload from a persisted order
    pub fn new_order(order: &Order) -> Self {
        Self::NewOrder {
            order_id: order.id,
            daily_number: order.daily_number,
            table_name: order.table_name.clone(),
            items: order.items.clone(),
            total_price: order.total_price,
            created_at: order.created_at,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::NewOrder { .. } => "NEW_ORDER",
            Self::StaffCall { .. } => "STAFF_CALL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_order_wire_shape() {
        let event = TerminalEvent::NewOrder {
            order_id: 7,
            daily_number: 3,
            table_name: Some("Table 1".to_string()),
            items: vec![OrderItemSnapshot {
                menu_id: Some(1),
                menu_name: "Ramen".to_string(),
                unit_price: 4500,
                quantity: 2,
                line_total: 9000,
                options_desc: Some("Spicy".to_string()),
            }],
            total_price: 9000,
            created_at: 1_700_000_000_000,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "NEW_ORDER");
        assert_eq!(json["daily_number"], 3);
        assert_eq!(json["table_name"], "Table 1");
        assert_eq!(json["items"][0]["menu_name"], "Ramen");
        assert_eq!(event.kind(), "NEW_ORDER");
    }

    #[test]
    fn staff_call_wire_shape() {
        let event = TerminalEvent::StaffCall {
            call_id: 1,
            table_name: "Table 4".to_string(),
            message: "Water please".to_string(),
            created_at: 1,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"STAFF_CALL\""));

        let back: TerminalEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
