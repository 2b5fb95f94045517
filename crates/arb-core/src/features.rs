//! Per-cycle feature snapshot.
//!
//! The feature collaborator produces a mapping of named indicator values.
//! Strategies only ever see finite numbers: NaN/Inf entries are dropped at
//! construction, so an absent key is the sentinel for "no usable value"
//! and strategy-side defaults apply.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Well-known feature names shared between the collaborator and strategies.
pub mod names {
    pub const MOMENTUM: &str = "momentum";
    pub const RSI: &str = "rsi";
    pub const STOCH_K: &str = "stoch_k";
    pub const GOLDEN_CROSS: &str = "golden_cross";
    pub const DEAD_CROSS: &str = "dead_cross";
    pub const IS_DOWNTREND: &str = "is_downtrend";
    pub const VOL_SPIKE: &str = "vol_spike";
    pub const TD_REVERSAL: &str = "td_reversal";
    pub const PULLBACK_DETECTED: &str = "pullback_detected";
    pub const BOX_RANGE: &str = "box_range";
    pub const SUPPORT_ACCUMULATION: &str = "support_accumulation";
    pub const VOLATILITY: &str = "volatility";
}

/// Immutable snapshot of named indicator values for one evaluation cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: HashMap<String, f64>,
}

impl FeatureVector {
    /// Build a snapshot from raw collaborator output, dropping non-finite
    /// values so strategies never observe NaN or infinity.
    pub fn new(raw: HashMap<String, f64>) -> Self {
        let mut values = HashMap::with_capacity(raw.len());
        let mut dropped = 0usize;
        for (name, value) in raw {
            if value.is_finite() {
                values.insert(name, value);
            } else {
                dropped += 1;
            }
        }
        if dropped > 0 {
            warn!(dropped, "Dropped non-finite feature values");
        }
        Self { values }
    }

    /// Empty snapshot (all strategies resolve to their neutral defaults).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Get a feature value, if present.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Get a feature value or a neutral default.
    pub fn value_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).unwrap_or(default)
    }

    /// Interpret a feature as a boolean flag (>= 0.5 is set).
    pub fn flag(&self, name: &str) -> bool {
        self.value_or(name, 0.0) >= 0.5
    }

    /// Number of usable features.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if no usable features survived sanitization.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, f64)> for FeatureVector {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
