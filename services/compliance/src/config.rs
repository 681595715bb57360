//! Compliance thresholds
//!
//! Every field has a serde default so a partial JSON file only needs to
//! name what it overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Configuration for the compliance service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceConfig {
    /// ISO country codes that count as a sanctions hit
    #[serde(default = "default_sanctioned_countries")]
    pub sanctioned_countries: Vec<String>,

    /// Points added for a sanctioned country
    #[serde(default = "default_sanctions_score")]
    pub sanctions_score: f64,

    /// Points per failed exchange
    #[serde(default = "default_failed_exchange_score")]
    pub failed_exchange_score: f64,

    /// Cap on the failed-exchange contribution
    #[serde(default = "default_failed_exchange_cap")]
    pub failed_exchange_cap: f64,

    /// Trailing window for daily usage
    #[serde(default = "default_daily_window_hours")]
    pub daily_window_hours: i64,

    /// Number of checks returned by the AML status lookup
    #[serde(default = "default_aml_history_limit")]
    pub aml_history_limit: u32,

    /// Lifetime of an approved KYC verification
    #[serde(default = "default_kyc_validity_days")]
    pub kyc_validity_days: i64,
}

fn default_sanctioned_countries() -> Vec<String> {
    vec!["IR".to_string(), "KP".to_string(), "SY".to_string()]
}

fn default_sanctions_score() -> f64 {
    80.0
}

fn default_failed_exchange_score() -> f64 {
    5.0
}

fn default_failed_exchange_cap() -> f64 {
    20.0
}

fn default_daily_window_hours() -> i64 {
    24
}

fn default_aml_history_limit() -> u32 {
    5
}

fn default_kyc_validity_days() -> i64 {
    365
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            sanctioned_countries: default_sanctioned_countries(),
            sanctions_score: default_sanctions_score(),
            failed_exchange_score: default_failed_exchange_score(),
            failed_exchange_cap: default_failed_exchange_cap(),
            daily_window_hours: default_daily_window_hours(),
            aml_history_limit: default_aml_history_limit(),
            kyc_validity_days: default_kyc_validity_days(),
        }
    }
}

impl ComplianceConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Apply environment overrides read through `lookup`
    ///
    /// `SANCTIONED_COUNTRIES` is a comma-separated list of country codes.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(list) = lookup("SANCTIONED_COUNTRIES") {
            self.sanctioned_countries = list
                .split(',')
                .map(|code| code.trim().to_ascii_uppercase())
                .filter(|code| !code.is_empty())
                .collect();
        }
        self
    }

    pub fn is_sanctioned(&self, country_code: &str) -> bool {
        self.sanctioned_countries
            .iter()
            .any(|c| c.eq_ignore_ascii_case(country_code))
    }

    pub fn daily_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.daily_window_hours)
    }

    pub fn kyc_validity(&self) -> chrono::Duration {
        chrono::Duration::days(self.kyc_validity_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ComplianceConfig::default();
        assert_eq!(config.sanctioned_countries, vec!["IR", "KP", "SY"]);
        assert_eq!(config.sanctions_score, 80.0);
        assert_eq!(config.failed_exchange_cap, 20.0);
        assert_eq!(config.daily_window(), chrono::Duration::hours(24));
        assert_eq!(config.aml_history_limit, 5);
        assert_eq!(config.kyc_validity(), chrono::Duration::days(365));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ComplianceConfig =
            serde_json::from_str(r#"{"aml_history_limit": 10}"#).unwrap();
        assert_eq!(config.aml_history_limit, 10);
        assert_eq!(config.daily_window_hours, 24);
        assert!(config.is_sanctioned("KP"));
    }

    #[test]
    fn test_env_override() {
        let config = ComplianceConfig::default().with_env(|key| match key {
            "SANCTIONED_COUNTRIES" => Some("cu, ru,".to_string()),
            _ => None,
        });
        assert_eq!(config.sanctioned_countries, vec!["CU", "RU"]);
        assert!(config.is_sanctioned("cu"));
        assert!(!config.is_sanctioned("IR"));
    }

    #[test]
    fn test_missing_file() {
        let err = ComplianceConfig::from_file(Path::new("/nonexistent/compliance.json"));
        assert!(matches!(err, Err(ConfigError::Io(_))));
    }
}
