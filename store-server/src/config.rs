//! Server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Server configuration, loaded from the environment
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Payment gateway webhook signing secret (HMAC-SHA512)
    pub webhook_secret: String,
    /// Warehouse used when the caller does not name one. Resolved once at
    /// startup; a missing row is a fatal configuration error.
    pub default_warehouse_id: i64,
    /// Notification endpoint for order status changes (optional)
    pub notify_url: Option<String>,
    /// Environment: development | staging | production
    pub environment: String,
}

impl Config {
    /// Require a secret env var: must be set and non-empty outside development.
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
            webhook_secret: Self::require_secret("WEBHOOK_SECRET", &environment)?,
            default_warehouse_id: std::env::var("DEFAULT_WAREHOUSE_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
            notify_url: std::env::var("NOTIFY_URL").ok().filter(|s| !s.is_empty()),
            environment,
        })
    }
}
