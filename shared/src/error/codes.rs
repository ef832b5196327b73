//! Unified error codes for the ordering backend
//!
//! This module defines all error codes returned to diner clients and store terminals.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Store errors
//! - 2xxx: Table / staff call errors
//! - 3xxx: Menu errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Inventory errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Store ====================
    /// Store not found
    StoreNotFound = 1001,
    /// Store is not accepting orders
    StoreClosed = 1002,

    // ==================== 2xxx: Table ====================
    /// Table not found (or token does not match)
    TableNotFound = 2001,
    /// Staff call not found
    StaffCallNotFound = 2101,
    /// Staff call has already been handled
    StaffCallAlreadyCompleted = 2102,

    // ==================== 3xxx: Menu ====================
    /// Menu item is sold out
    MenuSoldOut = 3001,
    /// Option does not exist for this menu item
    OptionNotFound = 3101,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has already been completed by the kitchen
    OrderAlreadyCompleted = 4002,
    /// Order has no priceable lines
    OrderEmpty = 4003,
    /// Merchant reference does not embed an order id
    MalformedReference = 4004,

    // ==================== 5xxx: Payment ====================
    /// Gateway has no record of the payment
    PaymentNotFound = 5001,
    /// Gateway amount differs from the order total
    AmountMismatch = 5002,
    /// Gateway payment is not in the paid state
    PaymentNotCompleted = 5003,
    /// Gateway payment belongs to a different merchant reference
    PaymentReferenceMismatch = 5004,
    /// Gateway receipt is already attached to another order
    PaymentAlreadyUsed = 5005,
    /// Gateway rejected our credentials
    GatewayAuthFailed = 5101,
    /// Gateway did not answer in time
    GatewayTimeout = 5102,
    /// Gateway unreachable or returned an unexpected response
    GatewayUnavailable = 5103,

    // ==================== 6xxx: Inventory ====================
    /// Not enough stock for a recipe ingredient
    InsufficientStock = 6001,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Store
            ErrorCode::StoreNotFound => "Store not found",
            ErrorCode::StoreClosed => "Store is not accepting orders",

            // Table
            ErrorCode::TableNotFound => "Table not found",
            ErrorCode::StaffCallNotFound => "Staff call not found",
            ErrorCode::StaffCallAlreadyCompleted => "Staff call has already been handled",

            // Menu
            ErrorCode::MenuSoldOut => "Menu item is sold out",
            ErrorCode::OptionNotFound => "Option not found for menu item",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderAlreadyCompleted => "Order has already been completed",
            ErrorCode::OrderEmpty => "Order is empty",
            ErrorCode::MalformedReference => "Malformed payment reference",

            // Payment
            ErrorCode::PaymentNotFound => "Payment not found",
            ErrorCode::AmountMismatch => "Paid amount does not match order total",
            ErrorCode::PaymentNotCompleted => "Payment has not been completed",
            ErrorCode::PaymentReferenceMismatch => "Payment belongs to a different order",
            ErrorCode::PaymentAlreadyUsed => "Payment is already attached to another order",
            ErrorCode::GatewayAuthFailed => "Payment service authentication failed",
            ErrorCode::GatewayTimeout => "Payment service timed out, please try again",
            ErrorCode::GatewayUnavailable => "Payment service unavailable, please try again",

            // Inventory
            ErrorCode::InsufficientStock => "Insufficient stock",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Store
            1001 => Ok(ErrorCode::StoreNotFound),
            1002 => Ok(ErrorCode::StoreClosed),

            // Table
            2001 => Ok(ErrorCode::TableNotFound),
            2101 => Ok(ErrorCode::StaffCallNotFound),
            2102 => Ok(ErrorCode::StaffCallAlreadyCompleted),

            // Menu
            3001 => Ok(ErrorCode::MenuSoldOut),
            3101 => Ok(ErrorCode::OptionNotFound),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderAlreadyCompleted),
            4003 => Ok(ErrorCode::OrderEmpty),
            4004 => Ok(ErrorCode::MalformedReference),

            // Payment
            5001 => Ok(ErrorCode::PaymentNotFound),
            5002 => Ok(ErrorCode::AmountMismatch),
            5003 => Ok(ErrorCode::PaymentNotCompleted),
            5004 => Ok(ErrorCode::PaymentReferenceMismatch),
            5005 => Ok(ErrorCode::PaymentAlreadyUsed),
            5101 => Ok(ErrorCode::GatewayAuthFailed),
            5102 => Ok(ErrorCode::GatewayTimeout),
            5103 => Ok(ErrorCode::GatewayUnavailable),

            // Inventory
            6001 => Ok(ErrorCode::InsufficientStock),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
