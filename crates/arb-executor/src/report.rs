//! Execution reporting.
//!
//! Every submit attempt and every terminal failure produces one record
//! through the [`Reporter`] seam. The executor never reads the sink back.

use crate::outcome::ExecutionErrorKind;
use arb_core::{SignalSource, Size, TradeAction};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// What happened to one attempt or terminal transition.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// The venue accepted the order.
    Accepted { order_id: String },
    /// Insufficient balance; the executor will shrink and retry.
    InsufficientBalance,
    /// Terminal failure.
    Failed(ExecutionErrorKind),
}

/// One execution event, for audit and analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRecord {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub action: TradeAction,
    /// Quantity of this attempt (the original quantity for pre-submit failures).
    pub quantity: Size,
    pub outcome: AttemptOutcome,
    /// Signal source behind the decision, when known.
    pub source: Option<SignalSource>,
}

/// Sink for execution records.
pub trait Reporter: Send + Sync {
    fn record(&self, record: &ExecutionRecord);
}

/// Reporter that emits structured log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn record(&self, record: &ExecutionRecord) {
        match &record.outcome {
            AttemptOutcome::Accepted { order_id } => info!(
                symbol = %record.symbol,
                action = ?record.action,
                qty = %record.quantity,
                source = ?record.source,
                %order_id,
                "order accepted"
            ),
            AttemptOutcome::InsufficientBalance => warn!(
                symbol = %record.symbol,
                action = ?record.action,
                qty = %record.quantity,
                source = ?record.source,
                "attempt rejected: insufficient balance"
            ),
            AttemptOutcome::Failed(kind) => warn!(
                symbol = %record.symbol,
                action = ?record.action,
                qty = %record.quantity,
                source = ?record.source,
                error = ?kind,
                "execution failed"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_log_reporter_accepts_all_shapes() {
        let reporter = LogReporter;
        let base = ExecutionRecord {
            timestamp: Utc::now(),
            symbol: "BTCUSDT".into(),
            action: TradeAction::Buy,
            quantity: Size::new(dec!(0.012)),
            outcome: AttemptOutcome::Accepted {
                order_id: "oid".into(),
            },
            source: Some(SignalSource::Trend),
        };
        reporter.record(&base);
        reporter.record(&ExecutionRecord {
            outcome: AttemptOutcome::InsufficientBalance,
            ..base.clone()
        });
        reporter.record(&ExecutionRecord {
            outcome: AttemptOutcome::Failed(ExecutionErrorKind::Network),
            source: None,
            ..base
        });
    }
}
