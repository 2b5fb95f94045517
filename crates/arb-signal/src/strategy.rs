//! Rule-based fallback strategies.
//!
//! Each strategy is a pure function of the feature snapshot and returns
//! HOLD with zero strength when its own entry conditions are not met —
//! a fallback must never force a directional action. Strategies never
//! call each other or share state.

use arb_core::features::names;
use arb_core::{Candidate, FeatureVector, SignalSource, TradeAction};

/// Trend-scoring margin: buy and sell scores must differ by more than this.
const TREND_MIN_MARGIN: i32 = 1;
/// Trend-scoring floor: the winning score must reach this.
const TREND_MIN_SCORE: i32 = 2;
/// Maximum achievable trend score, used to normalize strength.
const TREND_MAX_SCORE: f64 = 6.0;

/// The fixed set of fallback strategies.
///
/// New strategies are added as new variants, not discovered dynamically;
/// the declaration order here is also the arbitration priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackStrategy {
    /// Additive momentum/trend scoring.
    Trend,
    /// TD-style sequential exhaustion reversal.
    SequentialExhaustion,
    /// Volume pullback entry.
    PullbackEntry,
    /// Support accumulation in a range.
    Accumulation,
    /// Moving-average cross with RSI confirmation.
    MaCross,
}

impl FallbackStrategy {
    /// Signal source tag for candidates produced by this strategy.
    pub fn source(&self) -> SignalSource {
        match self {
            Self::Trend => SignalSource::Trend,
            Self::SequentialExhaustion => SignalSource::SequentialExhaustion,
            Self::PullbackEntry => SignalSource::PullbackEntry,
            Self::Accumulation => SignalSource::Accumulation,
            Self::MaCross => SignalSource::MaCross,
        }
    }

    /// Evaluate the strategy against a feature snapshot.
    ///
    /// Pure and side-effect-free. Missing features resolve to neutral
    /// defaults (RSI 50, stochastic 50, no flags), which always lands
    /// on HOLD.
    pub fn evaluate(&self, features: &FeatureVector) -> Candidate {
        match self {
            Self::Trend => self.eval_trend(features),
            Self::SequentialExhaustion => self.eval_sequential(features),
            Self::PullbackEntry => self.eval_pullback(features),
            Self::Accumulation => self.eval_accumulation(features),
            Self::MaCross => self.eval_ma_cross(features),
        }
    }

    /// Additive buy/sell scoring over crosses, momentum, RSI, stochastic
    /// and trend direction. A neutral market or an ambiguous score is HOLD.
    fn eval_trend(&self, f: &FeatureVector) -> Candidate {
        let golden = f.flag(names::GOLDEN_CROSS);
        let dead = f.flag(names::DEAD_CROSS);
        let momentum = f.value_or(names::MOMENTUM, 0.0);
        let rsi = f.value_or(names::RSI, 50.0);
        let stoch = f.value_or(names::STOCH_K, 50.0);
        let downtrend = f.flag(names::IS_DOWNTREND);

        // Neutral band: nothing is moving, don't manufacture a signal.
        if !golden
            && !dead
            && momentum.abs() <= 1e-3
            && (45.0..=55.0).contains(&rsi)
            && (30.0..=70.0).contains(&stoch)
        {
            return Candidate::hold(self.source());
        }

        let mut buy = 0i32;
        buy += if golden { 2 } else { 0 };
        buy += if momentum > 0.0 { 1 } else { 0 };
        buy += if rsi < 35.0 { 1 } else { 0 };
        buy += if stoch < 20.0 { 1 } else { 0 };
        buy += if !downtrend { 1 } else { 0 };

        let mut sell = 0i32;
        sell += if dead { 2 } else { 0 };
        sell += if momentum < 0.0 { 1 } else { 0 };
        sell += if rsi > 65.0 { 1 } else { 0 };
        sell += if stoch > 80.0 { 1 } else { 0 };
        sell += if downtrend { 1 } else { 0 };

        if buy.max(sell) < TREND_MIN_SCORE || (buy - sell).abs() <= TREND_MIN_MARGIN {
            return Candidate::hold(self.source());
        }

        let (action, score) = if sell > buy {
            (TradeAction::Sell, sell)
        } else {
            (TradeAction::Buy, buy)
        };
        Candidate::new(self.source(), action, f64::from(score) / TREND_MAX_SCORE)
    }

    /// Exhaustion reversal: a TD reversal flag fires against the prevailing
    /// trend; a deeply oversold downtrend with a volume spike is a
    /// contrarian BUY.
    fn eval_sequential(&self, f: &FeatureVector) -> Candidate {
        let downtrend = f.flag(names::IS_DOWNTREND);

        if f.flag(names::TD_REVERSAL) {
            let action = if downtrend {
                TradeAction::Buy
            } else {
                TradeAction::Sell
            };
            return Candidate::new(self.source(), action, 0.65).with_note("td_reversal");
        }

        let rsi = f.value_or(names::RSI, 50.0);
        let vol_spike = f.value_or(names::VOL_SPIKE, 1.0);
        if downtrend && rsi < 30.0 && vol_spike > 1.3 {
            return Candidate::new(self.source(), TradeAction::Buy, 0.6)
                .with_note("oversold_exhaustion");
        }

        Candidate::hold(self.source())
    }

    /// Volume pullback: a spike with a detected pullback in a non-downtrend
    /// is an entry; anything else is HOLD.
    fn eval_pullback(&self, f: &FeatureVector) -> Candidate {
        let vol_spike = f.value_or(names::VOL_SPIKE, 1.0);
        if vol_spike > 1.5 && f.flag(names::PULLBACK_DETECTED) && !f.flag(names::IS_DOWNTREND) {
            return Candidate::new(self.source(), TradeAction::Buy, 0.6);
        }
        Candidate::hold(self.source())
    }

    /// Accumulation: repeated absorption at support inside a box range.
    fn eval_accumulation(&self, f: &FeatureVector) -> Candidate {
        let accumulation = f.value_or(names::SUPPORT_ACCUMULATION, 0.0);
        if f.flag(names::BOX_RANGE) && accumulation >= 3.0 {
            return Candidate::new(self.source(), TradeAction::Buy, 0.55);
        }
        Candidate::hold(self.source())
    }

    /// EMA cross with RSI and momentum confirmation.
    fn eval_ma_cross(&self, f: &FeatureVector) -> Candidate {
        let rsi = f.value_or(names::RSI, 50.0);
        let momentum = f.value_or(names::MOMENTUM, 0.0);

        if f.flag(names::GOLDEN_CROSS) && rsi >= 55.0 && momentum >= 0.0 {
            return Candidate::new(self.source(), TradeAction::Buy, 0.7);
        }
        if f.flag(names::DEAD_CROSS) && rsi <= 45.0 && momentum <= 0.0 {
            return Candidate::new(self.source(), TradeAction::Sell, 0.7);
        }
        Candidate::hold(self.source())
    }
}
