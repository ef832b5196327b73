//! PortOne (iamport v1) REST client
//!
//! - `POST /users/getToken {imp_key, imp_secret}` → `response.access_token`
//! - `GET /payments/{imp_uid}` with `Authorization: <token>`
//! - `GET /payments/find/{merchant_uid}` with `Authorization: <token>`
//!
//! Every response is wrapped in `{code, message, response}`; `code == 0` is
//! success.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use super::gateway::{GatewayError, GatewayPayment, PaymentGateway};

#[derive(Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    response: Option<T>,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    imp_key: &'a str,
    imp_secret: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct PaymentResponse {
    imp_uid: String,
    merchant_uid: String,
    status: String,
    amount: serde_json::Number,
}

impl PaymentResponse {
    fn into_payment(self) -> Result<GatewayPayment, GatewayError> {
        let amount = self
            .amount
            .as_i64()
            .or_else(|| {
                self.amount
                    .as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .ok_or_else(|| GatewayError::Protocol(format!("non-integer amount {}", self.amount)))?;
        Ok(GatewayPayment {
            imp_uid: self.imp_uid,
            merchant_uid: self.merchant_uid,
            status: self.status,
            amount,
        })
    }
}

/// PortOne v1 gateway client
#[derive(Clone)]
pub struct PortOneClient {
    http: reqwest::Client,
    base_url: Url,
    imp_key: String,
    imp_secret: String,
}

impl std::fmt::Debug for PortOneClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortOneClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl PortOneClient {
    pub fn new(
        base_url: &str,
        imp_key: impl Into<String>,
        imp_secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| GatewayError::Protocol(format!("invalid base url: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::Protocol("base url cannot carry a path".into()));
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url,
            imp_key: imp_key.into(),
            imp_secret: imp_secret.into(),
        })
    }

    /// Base URL joined with percent-encoded path segments
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::Protocol("base url cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read_envelope<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<Envelope<T>, GatewayError> {
        resp.json::<Envelope<T>>()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout
                } else {
                    GatewayError::Protocol(e.without_url().to_string())
                }
            })
    }

    async fn find_payment(
        &self,
        token: &str,
        segments: &[&str],
    ) -> Result<Option<GatewayPayment>, GatewayError> {
        let resp = self
            .http
            .get(self.endpoint(segments)?)
            .header(reqwest::header::AUTHORIZATION, token)
            .send()
            .await?;

        match resp.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            StatusCode::UNAUTHORIZED => return Err(GatewayError::Auth),
            s if !s.is_success() => {
                return Err(GatewayError::Protocol(format!("payment lookup returned {s}")));
            }
            _ => {}
        }

        let envelope: Envelope<PaymentResponse> = Self::read_envelope(resp).await?;
        if envelope.code != 0 {
            tracing::debug!(
                code = envelope.code,
                message = envelope.message.as_deref().unwrap_or(""),
                "Gateway has no matching payment"
            );
            return Ok(None);
        }
        envelope.response.map(PaymentResponse::into_payment).transpose()
    }
}

#[async_trait]
impl PaymentGateway for PortOneClient {
    async fn access_token(&self) -> Result<String, GatewayError> {
        let resp = self
            .http
            .post(self.endpoint(&["users", "getToken"])?)
            .json(&TokenRequest {
                imp_key: &self.imp_key,
                imp_secret: &self.imp_secret,
            })
            .send()
            .await?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(GatewayError::Auth);
        }
        if !resp.status().is_success() {
            return Err(GatewayError::Protocol(format!(
                "getToken returned {}",
                resp.status()
            )));
        }

        let envelope: Envelope<TokenResponse> = Self::read_envelope(resp).await?;
        match (envelope.code, envelope.response) {
            (0, Some(token)) => Ok(token.access_token),
            _ => Err(GatewayError::Auth),
        }
    }

    async fn find_by_imp_uid(
        &self,
        token: &str,
        imp_uid: &str,
    ) -> Result<Option<GatewayPayment>, GatewayError> {
        self.find_payment(token, &["payments", imp_uid]).await
    }

    async fn find_by_merchant_uid(
        &self,
        token: &str,
        merchant_uid: &str,
    ) -> Result<Option<GatewayPayment>, GatewayError> {
        self.find_payment(token, &["payments", "find", merchant_uid])
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use shared::error::ErrorCode;

    use super::*;
    use crate::payment::PaymentReconciler;

    fn client(base: &str) -> PortOneClient {
        PortOneClient::new(base, "key", "secret", Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn endpoint_encodes_references() {
        let c = client("https://api.iamport.kr");
        let url = c.endpoint(&["payments", "../users/getToken"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.iamport.kr/payments/..%2Fusers%2FgetToken"
        );

        let url = c.endpoint(&["payments", "find", "order_12_a1"]).unwrap();
        assert_eq!(url.as_str(), "https://api.iamport.kr/payments/find/order_12_a1");
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let c = client("http://localhost:9000/mock/");
        let url = c.endpoint(&["users", "getToken"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/mock/users/getToken");
    }

    #[test]
    fn debug_hides_credentials() {
        let dbg = format!("{:?}", client("https://api.iamport.kr"));
        assert!(!dbg.contains("secret"));
        assert!(!dbg.contains("key\""));
    }

    #[test]
    fn payment_envelope_parses() {
        let json = r#"{
            "code": 0,
            "message": null,
            "response": {
                "imp_uid": "imp_123",
                "merchant_uid": "order_7",
                "status": "paid",
                "amount": 9000,
                "pay_method": "card"
            }
        }"#;
        let envelope: Envelope<PaymentResponse> = serde_json::from_str(json).unwrap();
        let payment = envelope.response.unwrap().into_payment().unwrap();
        assert_eq!(payment.amount, 9000);
        assert_eq!(payment.status, "paid");
    }

    #[test]
    fn float_amount_is_accepted_when_whole() {
        let raw: PaymentResponse = serde_json::from_str(
            r#"{"imp_uid":"imp_1","merchant_uid":"order_1","status":"paid","amount":9000.0}"#,
        )
        .unwrap();
        assert_eq!(raw.into_payment().unwrap().amount, 9000);

        let raw: PaymentResponse = serde_json::from_str(
            r#"{"imp_uid":"imp_1","merchant_uid":"order_1","status":"paid","amount":90.5}"#,
        )
        .unwrap();
        assert!(matches!(raw.into_payment(), Err(GatewayError::Protocol(_))));
    }

    /// Accepts connections and never writes a byte back
    async fn silent_gateway() -> (String, tokio::task::JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        (format!("http://{addr}"), handle)
    }

    #[tokio::test]
    async fn unanswered_request_is_a_timeout() {
        let (base, server) = silent_gateway().await;
        let client = PortOneClient::new(&base, "key", "secret", Duration::from_millis(100)).unwrap();

        let err = client.access_token().await.unwrap_err();
        assert!(matches!(err, GatewayError::Timeout), "{err:?}");

        // Client and reconciler deadlines race; either way it is a timeout
        let reconciler = PaymentReconciler::new(Arc::new(client), Duration::from_millis(100));
        for _ in 0..10 {
            let err = reconciler.lookup("imp_1", "order_1").await.unwrap_err();
            assert_eq!(err.code, ErrorCode::GatewayTimeout);
        }

        server.abort();
    }
}
