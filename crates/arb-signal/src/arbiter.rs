//! Candidate arbitration.

use crate::config::ArbiterConfig;
use arb_core::{Candidate, FinalDecision};
use tracing::debug;

/// Merges the optional model candidate and the fallback candidates into
/// one final decision.
///
/// The bias is explicit: a directional action is only taken when a single
/// candidate clears its threshold, and every ambiguous or weak input
/// resolves to HOLD. The model, when confident, always outranks the
/// fallbacks, HOLD included: a confident model HOLD suppresses every
/// fallback rather than yielding to one. Among fallbacks the chain order
/// is the tie-break, so the outcome is deterministic for a given input.
#[derive(Debug, Clone)]
pub struct SignalArbiter {
    config: ArbiterConfig,
}

impl SignalArbiter {
    pub fn new(config: ArbiterConfig) -> Self {
        Self { config }
    }

    /// Decide on a single action.
    ///
    /// `fallbacks` must be in chain priority order; earlier entries win
    /// over later ones at equal eligibility.
    pub fn decide(&self, model: Option<&Candidate>, fallbacks: &[Candidate]) -> FinalDecision {
        if let Some(candidate) = model {
            if candidate.strength >= self.config.model_confidence_threshold {
                debug!(
                    source = %candidate.source,
                    action = ?candidate.action,
                    strength = candidate.strength,
                    "model candidate wins arbitration"
                );
                return FinalDecision::from_candidate(candidate);
            }
        }

        for candidate in fallbacks {
            if candidate.action.is_directional()
                && candidate.strength >= self.config.fallback_threshold
            {
                debug!(
                    source = %candidate.source,
                    action = ?candidate.action,
                    strength = candidate.strength,
                    "fallback candidate wins arbitration"
                );
                return FinalDecision::from_candidate(candidate);
            }
        }

        debug!("no candidate cleared its threshold, holding");
        FinalDecision::hold()
    }
}

impl Default for SignalArbiter {
    fn default() -> Self {
        Self::new(ArbiterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arb_core::{SignalSource, TradeAction};

    fn candidate(source: SignalSource, action: TradeAction, strength: f64) -> Candidate {
        Candidate::new(source, action, strength)
    }

    #[test]
    fn test_confident_model_wins_over_fallbacks() {
        let arbiter = SignalArbiter::default();
        let model = candidate(SignalSource::Model, TradeAction::Buy, 0.8);
        let fallbacks = vec![candidate(SignalSource::Trend, TradeAction::Sell, 0.9)];

        let decision = arbiter.decide(Some(&model), &fallbacks);
        assert_eq!(decision.action, TradeAction::Buy);
        assert_eq!(decision.source, Some(SignalSource::Model));
    }

    #[test]
    fn test_weak_model_defers_to_fallbacks() {
        let arbiter = SignalArbiter::default();
        let model = candidate(SignalSource::Model, TradeAction::Buy, 0.4);
        let fallbacks = vec![candidate(SignalSource::Trend, TradeAction::Sell, 0.7)];

        let decision = arbiter.decide(Some(&model), &fallbacks);
        assert_eq!(decision.action, TradeAction::Sell);
        assert_eq!(decision.source, Some(SignalSource::Trend));
    }

    #[test]
    fn test_confident_model_hold_suppresses_fallbacks() {
        let arbiter = SignalArbiter::default();
        // A confident model HOLD is a decision, not an abstention: it must
        // win outright and keep directional fallbacks from firing.
        let model = candidate(SignalSource::Model, TradeAction::Hold, 0.99);
        let fallbacks = vec![candidate(SignalSource::MaCross, TradeAction::Buy, 0.7)];

        let decision = arbiter.decide(Some(&model), &fallbacks);
        assert_eq!(decision.action, TradeAction::Hold);
        assert_eq!(decision.source, Some(SignalSource::Model));
        assert!(!decision.is_actionable());
    }

    #[test]
    fn test_weak_model_hold_defers_to_fallbacks() {
        let arbiter = SignalArbiter::default();
        let model = candidate(SignalSource::Model, TradeAction::Hold, 0.4);
        let fallbacks = vec![candidate(SignalSource::Trend, TradeAction::Buy, 0.7)];

        let decision = arbiter.decide(Some(&model), &fallbacks);
        assert_eq!(decision.action, TradeAction::Buy);
        assert_eq!(decision.source, Some(SignalSource::Trend));
    }

    #[test]
    fn test_all_hold_yields_hold_with_no_source() {
        let arbiter = SignalArbiter::default();
        let fallbacks = vec![
            Candidate::hold(SignalSource::Trend),
            Candidate::hold(SignalSource::SequentialExhaustion),
            Candidate::hold(SignalSource::PullbackEntry),
            Candidate::hold(SignalSource::Accumulation),
            Candidate::hold(SignalSource::MaCross),
        ];

        let decision = arbiter.decide(None, &fallbacks);
        assert_eq!(decision.action, TradeAction::Hold);
        assert_eq!(decision.source, None);
        assert_eq!(decision.strength, 0.0);
        assert!(!decision.is_actionable());
    }

    #[test]
    fn test_weak_fallbacks_yield_hold() {
        let arbiter = SignalArbiter::default();
        let fallbacks = vec![
            candidate(SignalSource::Trend, TradeAction::Buy, 0.3),
            candidate(SignalSource::MaCross, TradeAction::Sell, 0.49),
        ];

        let decision = arbiter.decide(None, &fallbacks);
        assert_eq!(decision.action, TradeAction::Hold);
        assert_eq!(decision.source, None);
    }

    #[test]
    fn test_chain_order_breaks_ties() {
        let arbiter = SignalArbiter::default();
        // Two eligible fallbacks with identical strengths: first in order wins
        let fallbacks = vec![
            candidate(SignalSource::SequentialExhaustion, TradeAction::Buy, 0.65),
            candidate(SignalSource::MaCross, TradeAction::Sell, 0.65),
        ];

        let decision = arbiter.decide(None, &fallbacks);
        assert_eq!(decision.action, TradeAction::Buy);
        assert_eq!(decision.source, Some(SignalSource::SequentialExhaustion));
    }

    #[test]
    fn test_exact_threshold_is_eligible() {
        let arbiter = SignalArbiter::default();
        let model = candidate(SignalSource::Model, TradeAction::Sell, 0.60);
        let decision = arbiter.decide(Some(&model), &[]);
        assert_eq!(decision.action, TradeAction::Sell);

        let fallbacks = vec![candidate(SignalSource::Trend, TradeAction::Buy, 0.50)];
        let decision = arbiter.decide(None, &fallbacks);
        assert_eq!(decision.action, TradeAction::Buy);
    }
}
