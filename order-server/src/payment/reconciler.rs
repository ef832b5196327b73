//! Gateway lookup and verification for payment confirmation
//!
//! Every gateway round-trip is bounded by a timeout. Any failure here happens
//! before the order is touched, so the order stays PENDING and the client can
//! retry.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use shared::error::{AppError, AppResult, ErrorCode};

use super::gateway::{GatewayError, GatewayPayment, PaymentGateway, STATUS_PAID};

/// Extract the order id from a merchant reference.
///
/// Accepted forms: `order_<id>` and `order_<id>_<suffix>`.
pub fn parse_merchant_uid(merchant_uid: &str) -> AppResult<i64> {
    let malformed = || {
        AppError::new(ErrorCode::MalformedReference).with_detail("merchant_uid", merchant_uid)
    };

    let rest = merchant_uid.strip_prefix("order_").ok_or_else(malformed)?;
    let id_part = match rest.split_once('_') {
        Some((id, suffix)) if !suffix.is_empty() => id,
        Some(_) => return Err(malformed()),
        None => rest,
    };
    if id_part.is_empty() || !id_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    id_part
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(malformed)
}

/// Verify a gateway record against the order it claims to pay
pub fn check_gateway_payment(
    order_id: i64,
    order_total: i64,
    merchant_uid: &str,
    payment: &GatewayPayment,
) -> AppResult<()> {
    if payment.merchant_uid != merchant_uid {
        return Err(AppError::new(ErrorCode::PaymentReferenceMismatch)
            .with_detail("order_id", order_id));
    }
    if payment.amount != order_total {
        return Err(AppError::new(ErrorCode::AmountMismatch)
            .with_detail("order_id", order_id)
            .with_detail("expected", order_total)
            .with_detail("paid", payment.amount));
    }
    if payment.status != STATUS_PAID {
        return Err(AppError::new(ErrorCode::PaymentNotCompleted)
            .with_detail("order_id", order_id)
            .with_detail("gateway_status", payment.status.clone()));
    }
    Ok(())
}

/// Looks payments up at the gateway with bounded waits
#[derive(Clone)]
pub struct PaymentReconciler {
    gateway: Arc<dyn PaymentGateway>,
    timeout: Duration,
}

impl PaymentReconciler {
    pub fn new(gateway: Arc<dyn PaymentGateway>, timeout: Duration) -> Self {
        Self { gateway, timeout }
    }

    async fn bounded<T>(
        &self,
        call: &'static str,
        fut: impl Future<Output = Result<T, GatewayError>>,
    ) -> AppResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => {
                tracing::warn!(
                    call,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Payment gateway timed out"
                );
                Err(AppError::new(ErrorCode::GatewayTimeout))
            }
        }
    }

    /// Authenticate, then find the payment by `imp_uid`, falling back to
    /// `merchant_uid`.
    pub async fn lookup(&self, imp_uid: &str, merchant_uid: &str) -> AppResult<GatewayPayment> {
        let token = self
            .bounded("access_token", self.gateway.access_token())
            .await?;

        if let Some(payment) = self
            .bounded("find_by_imp_uid", self.gateway.find_by_imp_uid(&token, imp_uid))
            .await?
        {
            return Ok(payment);
        }

        tracing::info!(imp_uid, merchant_uid, "imp_uid unknown to gateway, trying merchant_uid");
        self.bounded(
            "find_by_merchant_uid",
            self.gateway.find_by_merchant_uid(&token, merchant_uid),
        )
        .await?
        .ok_or_else(|| {
            AppError::new(ErrorCode::PaymentNotFound).with_detail("merchant_uid", merchant_uid)
        })
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockGateway;
    use super::*;

    fn paid(imp_uid: &str, merchant_uid: &str, amount: i64) -> GatewayPayment {
        GatewayPayment {
            imp_uid: imp_uid.to_string(),
            merchant_uid: merchant_uid.to_string(),
            status: STATUS_PAID.to_string(),
            amount,
        }
    }

    fn reconciler(gw: Arc<MockGateway>) -> PaymentReconciler {
        PaymentReconciler::new(gw, Duration::from_secs(5))
    }

    #[test]
    fn merchant_uid_forms() {
        assert_eq!(parse_merchant_uid("order_42").unwrap(), 42);
        assert_eq!(parse_merchant_uid("order_42_1700000000").unwrap(), 42);
        assert_eq!(parse_merchant_uid("order_7_a_b").unwrap(), 7);

        for bad in ["", "order_", "order_x", "order_-1", "order_0", "ord_1", "order_12_", "order_+5"] {
            let err = parse_merchant_uid(bad).unwrap_err();
            assert_eq!(err.code, ErrorCode::MalformedReference, "{bad}");
        }
    }

    #[test]
    fn gateway_record_checks() {
        let ok = paid("imp_1", "order_7", 9000);
        assert!(check_gateway_payment(7, 9000, "order_7", &ok).is_ok());

        let err = check_gateway_payment(7, 8000, "order_7", &ok).unwrap_err();
        assert_eq!(err.code, ErrorCode::AmountMismatch);

        let err = check_gateway_payment(8, 9000, "order_8", &ok).unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentReferenceMismatch);

        let mut cancelled = ok.clone();
        cancelled.status = "cancelled".to_string();
        let err = check_gateway_payment(7, 9000, "order_7", &cancelled).unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentNotCompleted);
    }

    #[tokio::test]
    async fn lookup_by_imp_uid() {
        let gw = Arc::new(MockGateway::with_payment(paid("imp_1", "order_7", 9000)));
        let payment = reconciler(gw.clone()).lookup("imp_1", "order_7").await.unwrap();

        assert_eq!(payment.amount, 9000);
        assert_eq!(gw.calls(), vec!["access_token", "find_by_imp_uid"]);
    }

    #[tokio::test]
    async fn lookup_falls_back_to_merchant_uid() {
        let mut gw = MockGateway::default();
        gw.by_merchant_uid
            .insert("order_7".to_string(), paid("imp_real", "order_7", 9000));
        let gw = Arc::new(gw);

        let payment = reconciler(gw.clone())
            .lookup("imp_stale", "order_7")
            .await
            .unwrap();
        assert_eq!(payment.imp_uid, "imp_real");
        assert_eq!(
            gw.calls(),
            vec!["access_token", "find_by_imp_uid", "find_by_merchant_uid"]
        );
    }

    #[tokio::test]
    async fn lookup_not_found() {
        let gw = Arc::new(MockGateway::default());
        let err = reconciler(gw).lookup("imp_x", "order_7").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentNotFound);
    }

    #[tokio::test]
    async fn auth_failure_stops_lookup() {
        let gw = Arc::new(MockGateway {
            reject_auth: true,
            ..MockGateway::with_payment(paid("imp_1", "order_7", 9000))
        });
        let err = reconciler(gw.clone()).lookup("imp_1", "order_7").await.unwrap_err();

        assert_eq!(err.code, ErrorCode::GatewayAuthFailed);
        assert_eq!(gw.calls(), vec!["access_token"]);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_gateway_times_out() {
        let gw = Arc::new(MockGateway {
            delay: Some(Duration::from_secs(60)),
            ..MockGateway::with_payment(paid("imp_1", "order_7", 9000))
        });
        let err = reconciler(gw).lookup("imp_1", "order_7").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::GatewayTimeout);
    }
}
