//! Application configuration.

use crate::error::{AppError, AppResult};
use arb_executor::ExecutorConfig;
use arb_signal::ArbiterConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    /// Decisions are made and logged, nothing is submitted.
    #[default]
    Observation,
    /// Live trading enabled.
    Trading,
}

/// One traded instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolConfig {
    /// Instrument symbol (e.g. "BTCUSDT").
    pub symbol: String,
    /// Base order quantity before normalization and shrinking.
    pub order_quantity: Decimal,
}

/// Venue connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    /// REST API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API key. Empty is allowed in observation mode.
    #[serde(default)]
    pub api_key: String,
    /// API secret. Empty is allowed in observation mode.
    #[serde(default)]
    pub api_secret: String,
}

fn default_base_url() -> String {
    "https://api.bybit.com".to_string()
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            api_secret: String::new(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub mode: OperatingMode,
    #[serde(default)]
    pub symbols: Vec<SymbolConfig>,
    #[serde(default)]
    pub venue: VenueConfig,
    #[serde(default)]
    pub arbiter: ArbiterConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    /// Seconds between decision cycles.
    #[serde(default = "default_cycle_interval_secs")]
    pub cycle_interval_secs: u64,
    /// Seconds before cached instrument rules are refreshed.
    #[serde(default = "default_rules_refresh_secs")]
    pub rules_refresh_secs: u64,
}

fn default_cycle_interval_secs() -> u64 {
    60
}

fn default_rules_refresh_secs() -> u64 {
    3600
}

impl AppConfig {
    /// Load configuration, falling back to defaults when no file exists.
    pub fn load() -> AppResult<Self> {
        let config_path =
            std::env::var("ARB_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

        if Path::new(&config_path).exists() {
            Self::from_file(&config_path)
        } else {
            tracing::warn!(path = %config_path, "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("failed to read config: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn is_observation_mode(&self) -> bool {
        self.mode == OperatingMode::Observation
    }

    pub fn validate(&self) -> AppResult<()> {
        self.arbiter.validate().map_err(AppError::Config)?;
        self.executor.validate().map_err(AppError::Config)?;
        if self.cycle_interval_secs == 0 {
            return Err(AppError::Config("cycle_interval_secs must be positive".into()));
        }
        for sc in &self.symbols {
            if sc.order_quantity <= Decimal::ZERO {
                return Err(AppError::Config(format!(
                    "order_quantity for {} must be positive",
                    sc.symbol
                )));
            }
        }
        if self.mode == OperatingMode::Trading
            && (self.venue.api_key.is_empty() || self.venue.api_secret.is_empty())
        {
            return Err(AppError::Config(
                "trading mode requires api_key and api_secret".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.mode, OperatingMode::Observation);
        assert!(config.is_observation_mode());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            mode = "observation"
            cycle_interval_secs = 30

            [[symbols]]
            symbol = "BTCUSDT"
            order_quantity = "0.012"

            [arbiter]
            model_confidence_threshold = 0.7

            [executor]
            max_attempts = 3
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.cycle_interval_secs, 30);
        assert_eq!(config.symbols.len(), 1);
        assert_eq!(config.symbols[0].order_quantity, dec!(0.012));
        assert_eq!(config.arbiter.model_confidence_threshold, 0.7);
        assert_eq!(config.executor.max_attempts, 3);
        // Unspecified fields keep their defaults
        assert_eq!(config.executor.shrink_fraction, dec!(0.90));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_trading_mode_requires_credentials() {
        let config = AppConfig {
            mode: OperatingMode::Trading,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_quantity() {
        let config = AppConfig {
            symbols: vec![SymbolConfig {
                symbol: "BTCUSDT".into(),
                order_quantity: dec!(0),
            }],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
