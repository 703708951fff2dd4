//! API configuration
//!
//! Loaded from environment variables prefixed `API_`. Nested keys use a
//! double underscore, e.g. `API_SPLIT__VAT_RATE=0.21` or
//! `API_SETTLEMENT__MAX_ATTEMPTS=5`.

use domain_payables::{EngineConfig, EngineSettings, PayablesError, DEFAULT_MAX_ALLOCATION_ATTEMPTS};
use rust_decimal::Decimal;
use serde::Deserialize;

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Database URL
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Cost split between the two entities and the VAT rate
    #[serde(default)]
    pub split: SplitSettings,
    #[serde(default)]
    pub settlement: SettlementSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SplitSettings {
    pub share_a: Decimal,
    pub share_b: Decimal,
    /// No default; startup fails without it
    #[serde(default)]
    pub vat_rate: Option<Decimal>,
}

impl Default for SplitSettings {
    fn default() -> Self {
        Self {
            share_a: Decimal::new(65, 2),
            share_b: Decimal::new(35, 2),
            vat_rate: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettlementSettings {
    pub max_attempts: u32,
}

impl Default for SettlementSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ALLOCATION_ATTEMPTS,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_database_url() -> String {
    "postgres://localhost/payables".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: default_database_url(),
            log_level: default_log_level(),
            split: SplitSettings::default(),
            settlement: SettlementSettings::default(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::with_prefix("API")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validates the split and VAT settings into an engine configuration
    ///
    /// # Errors
    ///
    /// `PayablesError::Configuration` for a missing VAT rate, shares that do
    /// not sum to one, or zero settlement attempts.
    pub fn engine_config(&self) -> Result<EngineConfig, PayablesError> {
        EngineSettings {
            share_a: self.split.share_a,
            share_b: self.split.share_b,
            vat_rate: self.split.vat_rate,
            max_allocation_attempts: self.settlement.max_attempts,
        }
        .into_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config_requires_vat_rate() {
        let config = ApiConfig::default();
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert!(matches!(
            config.engine_config(),
            Err(PayablesError::Configuration(_))
        ));
    }

    #[test]
    fn test_engine_config_from_settings() {
        let mut config = ApiConfig::default();
        config.split.vat_rate = Some(dec!(0.21));
        config.settlement.max_attempts = 5;

        let engine = config.engine_config().unwrap();
        assert_eq!(engine.max_allocation_attempts(), 5);
        assert_eq!(engine.vat_divisor(), dec!(1.21));
    }

    #[test]
    fn test_unbalanced_split_is_rejected() {
        let mut config = ApiConfig::default();
        config.split.share_a = dec!(0.70);
        config.split.vat_rate = Some(dec!(0.21));
        assert!(config.engine_config().is_err());
    }
}
