//! Order server configuration

use std::time::Duration;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Order server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port (API + terminal WebSocket)
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// PortOne (iamport v1) REST base URL
    pub portone_api_url: String,
    /// PortOne REST API key
    pub portone_imp_key: String,
    /// PortOne REST API secret
    pub portone_imp_secret: String,
    /// Upper bound for every gateway round-trip
    pub gateway_timeout: Duration,
    /// Per-terminal outbound buffer (events beyond this mark the terminal as failed)
    pub terminal_channel_capacity: usize,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            portone_api_url: std::env::var("PORTONE_API_URL")
                .unwrap_or_else(|_| "https://api.iamport.kr".into())
                .trim_end_matches('/')
                .to_string(),
            portone_imp_key: Self::require_secret("PORTONE_IMP_KEY", &environment)?,
            portone_imp_secret: Self::require_secret("PORTONE_IMP_SECRET", &environment)?,
            gateway_timeout: Duration::from_secs(
                std::env::var("GATEWAY_TIMEOUT_SECS")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .filter(|secs| *secs > 0)
                    .unwrap_or(10),
            ),
            terminal_channel_capacity: std::env::var("TERMINAL_CHANNEL_CAPACITY")
                .ok()
                .and_then(|p| p.parse().ok())
                .filter(|cap| *cap > 0)
                .unwrap_or(64),
            environment,
        })
    }
}
