//! Arbitration thresholds.

use serde::{Deserialize, Serialize};

/// Configuration for the signal arbiter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbiterConfig {
    /// Minimum strength for the model candidate to win outright.
    #[serde(default = "default_model_confidence_threshold")]
    pub model_confidence_threshold: f64,
    /// Minimum strength for a fallback candidate to be actionable.
    #[serde(default = "default_fallback_threshold")]
    pub fallback_threshold: f64,
}

fn default_model_confidence_threshold() -> f64 {
    0.60
}

fn default_fallback_threshold() -> f64 {
    0.50
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            model_confidence_threshold: default_model_confidence_threshold(),
            fallback_threshold: default_fallback_threshold(),
        }
    }
}

impl ArbiterConfig {
    /// Validate threshold ranges.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.model_confidence_threshold) {
            return Err(format!(
                "model_confidence_threshold must be in [0, 1], got {}",
                self.model_confidence_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.fallback_threshold) {
            return Err(format!(
                "fallback_threshold must be in [0, 1], got {}",
                self.fallback_threshold
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        let config = ArbiterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.model_confidence_threshold, 0.60);
        assert_eq!(config.fallback_threshold, 0.50);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let config = ArbiterConfig {
            model_confidence_threshold: 1.2,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ArbiterConfig {
            fallback_threshold: -0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: ArbiterConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.model_confidence_threshold, 0.60);
    }
}
