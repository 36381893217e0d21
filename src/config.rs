//! Configuration loaded from environment variables with sensible defaults.

use std::env;
use std::str::FromStr;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

/// HTTP listeners
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host the API binds to
    pub host: String,
    /// Port the API binds to
    pub port: u16,
    /// Port of the Prometheus scrape server
    pub metrics_port: u16,
}

/// `PostgreSQL` configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection URL; `None` selects the in-memory store
    pub url: Option<String>,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

impl AppConfig {
    /// Load configuration from the process environment.
    /// Unparseable numbers fall back to their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            server: ServerConfig {
                host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(lookup("PORT"), 8080),
                metrics_port: parse_or(lookup("METRICS_PORT"), 9090),
            },
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
                max_connections: parse_or(lookup("DATABASE_MAX_CONNECTIONS"), 10),
            },
        }
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.metrics_port, 9090);
        assert!(config.database.url.is_none());
        assert_eq!(config.database.max_connections, 10);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "3000"),
            ("METRICS_PORT", "9100"),
            ("DATABASE_URL", "postgres://localhost/backoffice"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
        ]);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.metrics_port, 9100);
        assert_eq!(config.database.url.as_deref(), Some("postgres://localhost/backoffice"));
        assert_eq!(config.database.max_connections, 4);
    }

    #[test]
    fn test_invalid_numbers_and_blank_url_fall_back() {
        let config = config(&[("PORT", "not-a-port"), ("METRICS_PORT", "70000"), ("DATABASE_URL", "  ")]);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.metrics_port, 9090);
        assert!(config.database.url.is_none());
    }
}
