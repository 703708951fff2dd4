//! Engine configuration
//!
//! Validated once at startup. A bad split table or a missing VAT rate is a
//! configuration error and the engine refuses to start.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::Rate;
use crate::entity::SplitTable;
use crate::error::PayablesError;

/// Default number of snapshot re-reads before a settlement gives up
pub const DEFAULT_MAX_ALLOCATION_ATTEMPTS: u32 = 3;

/// Validated configuration for [`crate::PayablesEngine`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    split: SplitTable,
    vat_rate: Rate,
    max_allocation_attempts: u32,
}

impl EngineConfig {
    /// Creates a configuration with the default retry bound
    ///
    /// # Errors
    ///
    /// Returns `PayablesError::Configuration` if the VAT rate is unset,
    /// negative, or leaves `1 + vat` non-positive.
    pub fn new(split: SplitTable, vat_rate: Option<Rate>) -> Result<Self, PayablesError> {
        let vat_rate = vat_rate
            .ok_or_else(|| PayablesError::configuration("VAT rate is not set"))?;

        if vat_rate.as_decimal() < Decimal::ZERO {
            return Err(PayablesError::configuration(format!(
                "VAT rate must not be negative, got {}",
                vat_rate.as_decimal()
            )));
        }
        if Decimal::ONE + vat_rate.as_decimal() <= Decimal::ZERO {
            return Err(PayablesError::configuration("1 + VAT rate must be positive"));
        }

        Ok(Self {
            split,
            vat_rate,
            max_allocation_attempts: DEFAULT_MAX_ALLOCATION_ATTEMPTS,
        })
    }

    /// Overrides the settlement retry bound
    pub fn with_max_allocation_attempts(mut self, attempts: u32) -> Result<Self, PayablesError> {
        if attempts == 0 {
            return Err(PayablesError::configuration(
                "max_allocation_attempts must be at least 1",
            ));
        }
        self.max_allocation_attempts = attempts;
        Ok(self)
    }

    pub fn split(&self) -> &SplitTable {
        &self.split
    }

    pub fn vat_rate(&self) -> Rate {
        self.vat_rate
    }

    /// Returns `1 + vat`, the divisor that turns a gross amount into net
    pub fn vat_divisor(&self) -> Decimal {
        Decimal::ONE + self.vat_rate.as_decimal()
    }

    pub fn max_allocation_attempts(&self) -> u32 {
        self.max_allocation_attempts
    }
}

/// Raw settings as read from a configuration source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    pub share_a: Decimal,
    pub share_b: Decimal,
    #[serde(default)]
    pub vat_rate: Option<Decimal>,
    #[serde(default = "default_max_attempts")]
    pub max_allocation_attempts: u32,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ALLOCATION_ATTEMPTS
}

impl EngineSettings {
    /// Validates the raw settings into an [`EngineConfig`]
    pub fn into_config(self) -> Result<EngineConfig, PayablesError> {
        let split = SplitTable::pair(Rate::new(self.share_a), Rate::new(self.share_b))?;
        EngineConfig::new(split, self.vat_rate.map(Rate::new))?
            .with_max_allocation_attempts(self.max_allocation_attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn split() -> SplitTable {
        SplitTable::pair(Rate::new(dec!(0.65)), Rate::new(dec!(0.35))).unwrap()
    }

    #[test]
    fn test_missing_vat_is_configuration_error() {
        let result = EngineConfig::new(split(), None);
        assert!(matches!(result, Err(PayablesError::Configuration(_))));
    }

    #[test]
    fn test_negative_vat_rejected() {
        let result = EngineConfig::new(split(), Some(Rate::new(dec!(-0.21))));
        assert!(matches!(result, Err(PayablesError::Configuration(_))));
    }

    #[test]
    fn test_vat_divisor() {
        let config = EngineConfig::new(split(), Some(Rate::new(dec!(0.21)))).unwrap();
        assert_eq!(config.vat_divisor(), dec!(1.21));
        assert_eq!(config.max_allocation_attempts(), DEFAULT_MAX_ALLOCATION_ATTEMPTS);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let config = EngineConfig::new(split(), Some(Rate::new(dec!(0.21)))).unwrap();
        assert!(config.with_max_allocation_attempts(0).is_err());
    }

    #[test]
    fn test_settings_into_config() {
        let settings = EngineSettings {
            share_a: dec!(0.65),
            share_b: dec!(0.35),
            vat_rate: Some(dec!(0.21)),
            max_allocation_attempts: 5,
        };
        let config = settings.into_config().unwrap();
        assert_eq!(config.max_allocation_attempts(), 5);

        let bad = EngineSettings {
            share_a: dec!(0.6),
            share_b: dec!(0.35),
            vat_rate: Some(dec!(0.21)),
            max_allocation_attempts: 3,
        };
        assert!(matches!(bad.into_config(), Err(PayablesError::Configuration(_))));
    }
}
