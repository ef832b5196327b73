//! API routes for order-server

pub mod health;
pub mod logging;
pub mod orders;
pub mod payments;
pub mod staff_calls;
pub mod terminal_ws;

use axum::routing::{get, post};
use axum::{Router, middleware};
use shared::error::ApiResponse;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ServiceError;
use crate::state::AppState;

pub type ApiResult<T> = Result<ApiResponse<T>, ServiceError>;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Diner-facing (QR token is the credential)
    let diner = Router::new()
        .route("/api/orders", post(orders::create_order))
        .route("/api/payments/confirm", post(payments::confirm_payment))
        .route("/api/staff-calls", post(staff_calls::create_staff_call));

    // Store terminals
    let terminal = Router::new()
        .route("/api/stores/{store_id}/ws", get(terminal_ws::handle_terminal_ws))
        .route(
            "/api/stores/{store_id}/orders/outstanding",
            get(orders::list_outstanding),
        )
        .route(
            "/api/stores/{store_id}/staff-calls/open",
            get(staff_calls::list_open_calls),
        )
        .route("/api/orders/{order_id}/complete", post(orders::complete_order))
        .route(
            "/api/staff-calls/{call_id}/complete",
            post(staff_calls::complete_staff_call),
        );

    Router::new()
        .route("/health", get(health::health_check))
        .merge(diner)
        .merge(terminal)
        .layer(middleware::from_fn(logging::logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::payment::reconciler::mock::MockGateway;

    fn test_router() -> Router {
        // Never connects: the requests below are answered before any query
        let pool = sqlx::PgPool::connect_lazy("postgres://localhost/unused").unwrap();
        let state = AppState::with_gateway(
            pool,
            Arc::new(MockGateway::default()),
            Duration::from_secs(1),
            8,
        );
        create_router(state)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let resp = test_router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key(logging::REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn malformed_reference_uses_error_envelope() {
        let body = serde_json::json!({"imp_uid": "imp_1", "merchant_uid": "bogus"});
        let resp = test_router()
            .oneshot(
                Request::post("/api/payments/confirm")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["code"], 4004);
        assert_eq!(json["details"]["merchant_uid"], "bogus");
    }

    #[tokio::test]
    async fn request_id_is_propagated() {
        let resp = test_router()
            .oneshot(
                Request::get("/health")
                    .header(logging::REQUEST_ID_HEADER, "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.headers()[logging::REQUEST_ID_HEADER], "abc-123");
    }
}
