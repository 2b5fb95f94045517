//! Signal arbitration records.
//!
//! A `Candidate` is one source's proposal (model or fallback strategy);
//! a `FinalDecision` is the single arbitrated action for the cycle.
//! Both are immutable once created.

use crate::action::TradeAction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Origin of a trading signal candidate.
///
/// Fallback sources are listed in their fixed arbitration priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    /// Primary model-driven recommendation.
    Model,
    /// Momentum/trend scoring strategy.
    Trend,
    /// Sequential-exhaustion reversal strategy.
    SequentialExhaustion,
    /// Volume pullback entry strategy.
    PullbackEntry,
    /// Support-accumulation detection strategy.
    Accumulation,
    /// Moving-average cross strategy.
    MaCross,
}

impl fmt::Display for SignalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => write!(f, "model"),
            Self::Trend => write!(f, "trend"),
            Self::SequentialExhaustion => write!(f, "sequential_exhaustion"),
            Self::PullbackEntry => write!(f, "pullback_entry"),
            Self::Accumulation => write!(f, "accumulation"),
            Self::MaCross => write!(f, "ma_cross"),
        }
    }
}

/// A single source's proposed action with confidence strength.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Which source produced this candidate.
    pub source: SignalSource,
    /// Proposed action.
    pub action: TradeAction,
    /// Confidence in [0, 1].
    pub strength: f64,
    /// Optional human-readable context (e.g. which rule fired).
    pub note: Option<String>,
}

impl Candidate {
    /// Create a candidate, clamping strength into [0, 1].
    pub fn new(source: SignalSource, action: TradeAction, strength: f64) -> Self {
        Self {
            source,
            action,
            strength: strength.clamp(0.0, 1.0),
            note: None,
        }
    }

    /// Attach a context note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Neutral candidate: HOLD with zero strength.
    pub fn hold(source: SignalSource) -> Self {
        Self::new(source, TradeAction::Hold, 0.0)
    }
}

/// The arbitrated, single action for one trading cycle.
///
/// `source` is `None` exactly when no candidate cleared its threshold
/// and the decision defaulted to HOLD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalDecision {
    /// Arbitrated action.
    pub action: TradeAction,
    /// Winning source, if any candidate cleared its threshold.
    pub source: Option<SignalSource>,
    /// Strength of the winning candidate (0.0 for the HOLD default).
    pub strength: f64,
    /// Decision timestamp.
    pub decided_at: DateTime<Utc>,
}

impl FinalDecision {
    /// Decision won by a specific candidate.
    pub fn from_candidate(candidate: &Candidate) -> Self {
        Self {
            action: candidate.action,
            source: Some(candidate.source),
            strength: candidate.strength,
            decided_at: Utc::now(),
        }
    }

    /// Default HOLD decision (no source cleared its threshold).
    pub fn hold() -> Self {
        Self {
            action: TradeAction::Hold,
            source: None,
            strength: 0.0,
            decided_at: Utc::now(),
        }
    }

    /// True if this decision should reach the executor at all.
    pub fn is_actionable(&self) -> bool {
        self.action.is_directional()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strength_clamped() {
        let c = Candidate::new(SignalSource::Trend, TradeAction::Buy, 1.7);
        assert_eq!(c.strength, 1.0);
        let c = Candidate::new(SignalSource::Trend, TradeAction::Sell, -0.2);
        assert_eq!(c.strength, 0.0);
    }

    #[test]
    fn test_hold_candidate_is_neutral() {
        let c = Candidate::hold(SignalSource::MaCross);
        assert_eq!(c.action, TradeAction::Hold);
        assert_eq!(c.strength, 0.0);
    }

    #[test]
    fn test_hold_decision_has_no_source() {
        let d = FinalDecision::hold();
        assert_eq!(d.action, TradeAction::Hold);
        assert!(d.source.is_none());
        assert!(!d.is_actionable());
    }

    #[test]
    fn test_decision_from_candidate() {
        let c = Candidate::new(SignalSource::Model, TradeAction::Sell, 0.8);
        let d = FinalDecision::from_candidate(&c);
        assert_eq!(d.action, TradeAction::Sell);
        assert_eq!(d.source, Some(SignalSource::Model));
        assert!(d.is_actionable());
    }
}
