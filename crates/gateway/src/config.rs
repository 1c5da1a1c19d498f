//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Gateway configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default `"0.0.0.0"`)
/// - `PORT`: listen port (default `8080`)
/// - `RUST_LOG`: tracing filter directive (default `"info"`)
/// - `ORDERS_DB_URL`: PostgreSQL URL for the ledger; unset means in-memory
/// - `GATEWAY_CALL_TIMEOUT_MS`: per-call deadline (default `10000`)
/// - `GATEWAY_NOTIFY_TIMEOUT_MS`: receipt delivery deadline (default `10000`)
/// - `NOTIFICATIONS_ENABLED`: dispatch receipts at all (default `true`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub orders_db_url: Option<String>,
    pub call_timeout: Duration,
    pub notify_timeout: Duration,
    pub notifications_enabled: bool,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let millis = |name: &str, default: Duration| {
            lookup(name)
                .and_then(|ms| ms.trim().parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(default)
        };

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            orders_db_url: lookup("ORDERS_DB_URL").filter(|url| !url.is_empty()),
            call_timeout: millis("GATEWAY_CALL_TIMEOUT_MS", defaults.call_timeout),
            notify_timeout: millis("GATEWAY_NOTIFY_TIMEOUT_MS", defaults.notify_timeout),
            notifications_enabled: lookup("NOTIFICATIONS_ENABLED")
                .map(|v| !matches!(v.trim(), "false" | "0"))
                .unwrap_or(defaults.notifications_enabled),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            orders_db_url: None,
            call_timeout: Duration::from_secs(10),
            notify_timeout: Duration::from_secs(10),
            notifications_enabled: true,
        }
    }
}
