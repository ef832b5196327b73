//! Order Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Payment state of an order. `Pending → Paid` happens exactly once.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

/// Order line captured at order time.
///
/// Name and prices are copied from the menu so later menu edits never
/// rewrite order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItemSnapshot {
    /// Source menu id (informational, the menu may since have been deleted)
    pub menu_id: Option<i64>,
    pub menu_name: String,
    /// Base price plus option deltas, per unit
    pub unit_price: i64,
    pub quantity: i32,
    pub line_total: i64,
    /// Comma-separated option names, e.g. "Spicy, Extra cheese"
    pub options_desc: Option<String>,
}

/// Order with its snapshotted items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub store_id: i64,
    /// None for takeout / unassigned orders
    pub table_id: Option<i64>,
    pub table_name: Option<String>,
    /// Sequential number within the store's trading day
    pub daily_number: i32,
    pub total_price: i64,
    pub payment_status: PaymentStatus,
    pub imp_uid: Option<String>,
    pub merchant_uid: Option<String>,
    pub paid_amount: Option<i64>,
    pub paid_at: Option<i64>,
    pub is_completed: bool,
    pub created_at: i64,
    pub items: Vec<OrderItemSnapshot>,
}

/// One requested line. Prices are never accepted from the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub menu_id: i64,
    pub quantity: i32,
    #[serde(default)]
    pub option_ids: Vec<i64>,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub store_id: i64,
    /// Table being ordered from; requires the matching `table_token`
    pub table_id: Option<i64>,
    /// QR token of the table (the diner's only credential)
    pub table_token: Option<String>,
    pub items: Vec<OrderLineRequest>,
}

/// Payment confirmation payload (gateway references from the client SDK)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirm {
    pub imp_uid: String,
    pub merchant_uid: String,
}

/// Outcome of a successful confirmation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmStatus {
    /// This call moved the order to PAID
    Success,
    /// The order was already PAID; nothing changed
    AlreadyPaid,
}

/// Payment confirmation response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentConfirmation {
    pub status: ConfirmStatus,
    pub order_id: i64,
    pub daily_number: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_status_text_roundtrip() {
        assert_eq!(PaymentStatus::Paid.as_str(), "PAID");
        assert_eq!("PENDING".parse::<PaymentStatus>(), Ok(PaymentStatus::Pending));
        assert!("REFUNDED".parse::<PaymentStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Paid).unwrap(),
            "\"PAID\""
        );
    }

    #[test]
    fn order_line_ignores_client_prices() {
        let json = r#"{"menu_id": 3, "quantity": 2, "option_ids": [9], "price": 1}"#;
        let line: OrderLineRequest = serde_json::from_str(json).unwrap();
        assert_eq!(line.menu_id, 3);
        assert_eq!(line.quantity, 2);
        assert_eq!(line.option_ids, vec![9]);
    }

    #[test]
    fn confirm_status_wire_names() {
        let body = PaymentConfirmation {
            status: ConfirmStatus::AlreadyPaid,
            order_id: 12,
            daily_number: 4,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], "already_paid");
        assert_eq!(json["daily_number"], 4);
    }
}
