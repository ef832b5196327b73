//! Application state for order-server

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::error::BoxError;
use crate::live::TerminalHub;
use crate::payment::{PaymentGateway, PaymentReconciler, PortOneClient};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// Connected store terminals
    pub hub: TerminalHub,
    /// Gateway lookups for payment confirmation
    pub reconciler: PaymentReconciler,
    /// Outbound buffer per terminal WebSocket
    pub terminal_channel_capacity: usize,
}

impl AppState {
    /// Connect to Postgres, run migrations and build the PortOne client
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        let gateway = PortOneClient::new(
            &config.portone_api_url,
            config.portone_imp_key.clone(),
            config.portone_imp_secret.clone(),
            config.gateway_timeout,
        )?;

        Ok(Self::with_gateway(
            pool,
            Arc::new(gateway),
            config.gateway_timeout,
            config.terminal_channel_capacity,
        ))
    }

    /// Assemble state around an existing pool and gateway
    pub fn with_gateway(
        pool: PgPool,
        gateway: Arc<dyn PaymentGateway>,
        gateway_timeout: std::time::Duration,
        terminal_channel_capacity: usize,
    ) -> Self {
        Self {
            pool,
            hub: TerminalHub::new(),
            reconciler: PaymentReconciler::new(gateway, gateway_timeout),
            terminal_channel_capacity,
        }
    }
}
