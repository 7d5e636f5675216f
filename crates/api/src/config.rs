//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `pretty` or `json` (default: `pretty`)
/// - `DATABASE_URL`: Postgres connection string; in-memory stores when unset
/// - `COUNTER_SERVICE_URL`: Article service base URL; in-memory counter when unset
/// - `COUNTER_TIMEOUT_MS`: timeout of one counter call (default: `2000`)
/// - `REQUEST_TIMEOUT_MS`: timeout of one inbound request (default: `10000`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub counter_service_url: Option<String>,
    pub counter_timeout: Duration,
    pub request_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT").unwrap_or(defaults.port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: std::env::var("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or_default(),
            database_url: non_empty_var("DATABASE_URL"),
            counter_service_url: non_empty_var("COUNTER_SERVICE_URL"),
            counter_timeout: parse_var("COUNTER_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.counter_timeout),
            request_timeout: parse_var("REQUEST_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_timeout),
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
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            database_url: None,
            counter_service_url: None,
            counter_timeout: Duration::from_millis(2000),
            request_timeout: Duration::from_millis(10_000),
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
