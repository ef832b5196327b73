//! Payment reconciliation against the PortOne (iamport v1) gateway
//!
//! The gateway is the authority on what was paid. The order total held by
//! the server is the authority on what should have been paid. Confirmation
//! succeeds only when both agree.

pub mod gateway;
pub mod portone;
pub mod reconciler;

pub use gateway::{GatewayError, GatewayPayment, PaymentGateway};
pub use portone::PortOneClient;
pub use reconciler::{PaymentReconciler, check_gateway_payment, parse_merchant_uid};
