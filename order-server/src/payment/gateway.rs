//! Gateway abstraction

use async_trait::async_trait;
use shared::error::{AppError, ErrorCode};

/// Gateway status of a completed payment
pub const STATUS_PAID: &str = "paid";

/// Payment record as reported by the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayPayment {
    pub imp_uid: String,
    pub merchant_uid: String,
    /// ready | paid | cancelled | failed
    pub status: String,
    pub amount: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway rejected credentials")]
    Auth,
    #[error("gateway did not answer in time")]
    Timeout,
    #[error("gateway transport error: {0}")]
    Transport(String),
    #[error("unexpected gateway response: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return GatewayError::Timeout;
        }
        // Request URLs embed payment references
        GatewayError::Transport(e.without_url().to_string())
    }
}

impl From<GatewayError> for AppError {
    fn from(e: GatewayError) -> Self {
        tracing::warn!(error = %e, "Payment gateway call failed");
        match e {
            GatewayError::Auth => AppError::new(ErrorCode::GatewayAuthFailed),
            GatewayError::Timeout => AppError::new(ErrorCode::GatewayTimeout),
            GatewayError::Transport(_) | GatewayError::Protocol(_) => {
                AppError::new(ErrorCode::GatewayUnavailable)
            }
        }
    }
}

/// Read-only view of the payment gateway.
///
/// Lookups return `Ok(None)` when the gateway has no such payment.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Obtain a short-lived access token
    async fn access_token(&self) -> Result<String, GatewayError>;

    async fn find_by_imp_uid(
        &self,
        token: &str,
        imp_uid: &str,
    ) -> Result<Option<GatewayPayment>, GatewayError>;

    async fn find_by_merchant_uid(
        &self,
        token: &str,
        merchant_uid: &str,
    ) -> Result<Option<GatewayPayment>, GatewayError>;
}
