//! Fixed fallback evaluation chain with fault containment.

use crate::strategy::FallbackStrategy;
use arb_core::{Candidate, FeatureVector};
use std::panic::{self, AssertUnwindSafe};
use tracing::warn;

/// The five fallback strategies in arbitration priority order.
const CHAIN: [FallbackStrategy; 5] = [
    FallbackStrategy::Trend,
    FallbackStrategy::SequentialExhaustion,
    FallbackStrategy::PullbackEntry,
    FallbackStrategy::Accumulation,
    FallbackStrategy::MaCross,
];

/// Evaluates every fallback strategy against one feature snapshot.
///
/// A panicking strategy is contained: its slot degrades to HOLD and the
/// remaining strategies still run, so one bad rule can never take the
/// whole signal path down.
#[derive(Debug, Default)]
pub struct FallbackChain;

impl FallbackChain {
    pub fn new() -> Self {
        Self
    }

    /// Number of strategies in the chain.
    pub fn len(&self) -> usize {
        CHAIN.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Evaluate all strategies, in priority order.
    ///
    /// Always returns exactly one candidate per strategy.
    pub fn evaluate(&self, features: &FeatureVector) -> Vec<Candidate> {
        CHAIN
            .iter()
            .map(|strategy| contained(strategy.source(), || strategy.evaluate(features)))
            .collect()
    }
}

/// Run one strategy evaluation, degrading a panic to HOLD.
fn contained(
    source: arb_core::SignalSource,
    eval: impl FnOnce() -> Candidate,
) -> Candidate {
    match panic::catch_unwind(AssertUnwindSafe(eval)) {
        Ok(candidate) => candidate,
        Err(_) => {
            warn!(%source, "fallback strategy panicked, degrading to hold");
            Candidate::hold(source)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arb_core::{SignalSource, TradeAction};

    #[test]
    fn test_chain_arity_and_order() {
        let chain = FallbackChain::new();
        let candidates = chain.evaluate(&FeatureVector::empty());
        assert_eq!(candidates.len(), 5);
        assert_eq!(candidates[0].source, SignalSource::Trend);
        assert_eq!(candidates[1].source, SignalSource::SequentialExhaustion);
        assert_eq!(candidates[2].source, SignalSource::PullbackEntry);
        assert_eq!(candidates[3].source, SignalSource::Accumulation);
        assert_eq!(candidates[4].source, SignalSource::MaCross);
    }

    #[test]
    fn test_empty_features_all_hold() {
        let chain = FallbackChain::new();
        for candidate in chain.evaluate(&FeatureVector::empty()) {
            assert_eq!(candidate.action, TradeAction::Hold);
        }
    }

    #[test]
    fn test_panicking_evaluation_degrades_to_hold() {
        let candidate = contained(SignalSource::Trend, || panic!("bad rule"));
        assert_eq!(candidate.source, SignalSource::Trend);
        assert_eq!(candidate.action, TradeAction::Hold);
        assert_eq!(candidate.strength, 0.0);
    }
}
