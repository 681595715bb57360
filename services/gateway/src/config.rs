//! Gateway configuration, read from the process environment

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// Postgres URL; without one the gateway runs on an in-memory store
    pub database_url: Option<String>,
    pub addr: SocketAddr,
    pub db_max_connections: u32,
    /// Optional JSON file with compliance thresholds
    pub compliance_config_path: Option<PathBuf>,
}

impl GatewayConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let addr_raw = lookup("GATEWAY_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr_raw.parse().map_err(|_| ConfigError::Invalid {
            key: "GATEWAY_ADDR",
            value: addr_raw.clone(),
        })?;

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::Invalid {
                    key: "DB_MAX_CONNECTIONS",
                    value: raw,
                })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url,
            addr,
            db_max_connections,
            compliance_config_path: lookup("COMPLIANCE_CONFIG").map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database_url, None);
        assert_eq!(config.addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.compliance_config_path, None);
    }

    #[test]
    fn test_overrides() {
        let config = GatewayConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/exchange"),
            ("GATEWAY_ADDR", "127.0.0.1:9000"),
            ("DB_MAX_CONNECTIONS", "12"),
        ]))
        .unwrap();
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/exchange"));
        assert_eq!(config.addr.port(), 9000);
        assert_eq!(config.db_max_connections, 12);
    }

    #[test]
    fn test_invalid_values() {
        let err = GatewayConfig::from_lookup(lookup(&[("GATEWAY_ADDR", "nowhere")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "GATEWAY_ADDR",
                value: "nowhere".to_string()
            }
        );
        assert!(GatewayConfig::from_lookup(lookup(&[("DB_MAX_CONNECTIONS", "0")])).is_err());
    }

    #[test]
    fn test_blank_database_url_is_absent() {
        let config = GatewayConfig::from_lookup(lookup(&[("DATABASE_URL", "  ")])).unwrap();
        assert_eq!(config.database_url, None);
    }
}
