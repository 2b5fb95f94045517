//! The retrying executor.

use crate::outcome::{ExecutionErrorKind, ExecutionOutcome};
use crate::report::{AttemptOutcome, ExecutionRecord, Reporter};
use arb_core::{OrderRequest, OrderSide, SignalSource, Size, TradeAction};
use arb_exchange::{
    BalanceOracle, ExchangeClient, ExchangeError, ExchangeRules, OrderNormalizer, RejectCode,
};
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Executor tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Maximum submit attempts per execution.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Quantity multiplier applied on each insufficient-balance retry.
    #[serde(default = "default_shrink_fraction")]
    pub shrink_fraction: Decimal,
    /// Position leverage, used in the affordability calculation.
    #[serde(default = "default_leverage")]
    pub leverage: u32,
    /// Taker fee rate.
    #[serde(default = "default_taker_fee")]
    pub taker_fee: Decimal,
    /// Extra margin headroom so a shrunk order does not land exactly on
    /// the balance edge and bounce again.
    #[serde(default = "default_margin_buffer")]
    pub margin_buffer: Decimal,
    /// Deadline for a single submit round-trip.
    #[serde(default = "default_submit_timeout", with = "duration_secs")]
    pub submit_timeout: Duration,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_shrink_fraction() -> Decimal {
    Decimal::new(90, 2) // 0.90
}

fn default_leverage() -> u32 {
    10
}

fn default_taker_fee() -> Decimal {
    Decimal::new(6, 4) // 0.0006
}

fn default_margin_buffer() -> Decimal {
    Decimal::new(15, 4) // 0.0015
}

fn default_submit_timeout() -> Duration {
    Duration::from_secs(10)
}

/// Serialize the submit timeout as whole seconds in config files.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            shrink_fraction: default_shrink_fraction(),
            leverage: default_leverage(),
            taker_fee: default_taker_fee(),
            margin_buffer: default_margin_buffer(),
            submit_timeout: default_submit_timeout(),
        }
    }
}

impl ExecutorConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".into());
        }
        if self.shrink_fraction <= Decimal::ZERO || self.shrink_fraction >= Decimal::ONE {
            return Err(format!(
                "shrink_fraction must be in (0, 1), got {}",
                self.shrink_fraction
            ));
        }
        if self.leverage == 0 {
            return Err("leverage must be at least 1".into());
        }
        Ok(())
    }

    /// Margin cost per unit of quantity at a given price.
    fn cost_per_unit(&self, price: Decimal) -> Decimal {
        let factor =
            Decimal::ONE / Decimal::from(self.leverage) + self.taker_fee + self.margin_buffer;
        price * factor
    }
}

/// Submits orders with per-symbol mutual exclusion and a bounded
/// shrink-and-retry loop on insufficient balance.
///
/// Every path out of [`execute`](Self::execute) is terminal: the caller
/// gets exactly one outcome per request, quantities across attempts only
/// ever decrease, and each attempt is reported through the reporter seam.
pub struct RetryingExecutor {
    client: Arc<dyn ExchangeClient>,
    rules: Arc<ExchangeRules>,
    oracle: BalanceOracle,
    normalizer: OrderNormalizer,
    reporter: Arc<dyn Reporter>,
    config: ExecutorConfig,
    symbol_locks: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
}

impl RetryingExecutor {
    pub fn new(
        client: Arc<dyn ExchangeClient>,
        rules: Arc<ExchangeRules>,
        reporter: Arc<dyn Reporter>,
        mut config: ExecutorConfig,
    ) -> Self {
        // The attempt loop needs at least one iteration even if the config
        // skipped validation.
        config.max_attempts = config.max_attempts.max(1);
        Self {
            oracle: BalanceOracle::new(client.clone()),
            client,
            rules,
            normalizer: OrderNormalizer::new(),
            reporter,
            config,
            symbol_locks: DashMap::new(),
        }
    }

    /// Execute one order to a terminal outcome.
    ///
    /// `source` is the signal source behind the decision, carried into the
    /// execution records. At most one execution runs per symbol at a time;
    /// a second request for the same symbol waits rather than interleaving
    /// attempts.
    pub async fn execute(
        &self,
        request: OrderRequest,
        source: Option<SignalSource>,
        cancel: &CancellationToken,
    ) -> ExecutionOutcome {
        let lock = self
            .symbol_locks
            .entry(request.symbol.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        self.run_attempts(&request, source, cancel).await
    }

    fn report(&self, request: &OrderRequest, quantity: Size, outcome: AttemptOutcome, source: Option<SignalSource>) {
        self.reporter.record(&ExecutionRecord {
            timestamp: Utc::now(),
            symbol: request.symbol.clone(),
            action: match request.side {
                OrderSide::Buy => TradeAction::Buy,
                OrderSide::Sell => TradeAction::Sell,
            },
            quantity,
            outcome,
            source,
        });
    }

    /// Terminal rejection: emit the record, build the outcome.
    fn fail(
        &self,
        request: &OrderRequest,
        quantity: Size,
        kind: ExecutionErrorKind,
        attempts: u32,
        source: Option<SignalSource>,
    ) -> ExecutionOutcome {
        self.report(request, quantity, AttemptOutcome::Failed(kind.clone()), source);
        ExecutionOutcome::rejected(kind, attempts, quantity)
    }

    async fn run_attempts(
        &self,
        request: &OrderRequest,
        source: Option<SignalSource>,
        cancel: &CancellationToken,
    ) -> ExecutionOutcome {
        let rules = match self.rules.get(&request.symbol).await {
            Ok(rules) => rules,
            Err(e) => {
                let kind = if e.is_network() {
                    ExecutionErrorKind::Network
                } else {
                    ExecutionErrorKind::Unknown
                };
                warn!(symbol = %request.symbol, error = %e, "instrument rules unavailable");
                return self.fail(request, request.quantity, kind, 0, source);
            }
        };

        let mut current = match self.normalizer.normalize(request, &rules) {
            Ok(normalized) => normalized,
            Err(e) => {
                warn!(symbol = %request.symbol, error = %e, "order failed normalization");
                return self.fail(
                    request,
                    request.quantity,
                    ExecutionErrorKind::Normalization(e),
                    0,
                    source,
                );
            }
        };

        for attempt in 1..=self.config.max_attempts {
            debug!(
                symbol = %current.symbol,
                attempt,
                qty = %current.quantity,
                cloid = %current.cloid,
                "submitting order"
            );

            let submit = self.client.submit_order(&current);
            let result = match tokio::time::timeout(self.config.submit_timeout, submit).await {
                Ok(result) => result,
                Err(_) => {
                    // The order may have reached the venue; resubmitting
                    // the same size could double the position.
                    warn!(symbol = %current.symbol, attempt, "submit timed out");
                    return self.fail(
                        &current,
                        current.quantity,
                        ExecutionErrorKind::Network,
                        attempt,
                        source,
                    );
                }
            };

            match result {
                Ok(ack) => {
                    info!(
                        symbol = %current.symbol,
                        attempt,
                        qty = %current.quantity,
                        order_id = %ack.order_id,
                        "order accepted"
                    );
                    self.report(
                        &current,
                        current.quantity,
                        AttemptOutcome::Accepted {
                            order_id: ack.order_id.clone(),
                        },
                        source,
                    );
                    return ExecutionOutcome::accepted(ack.order_id, attempt, current.quantity);
                }
                Err(ExchangeError::Rejected(RejectCode::InsufficientBalance)) => {
                    if attempt == self.config.max_attempts {
                        warn!(symbol = %current.symbol, attempt, "attempt budget exhausted");
                        return self.fail(
                            &current,
                            current.quantity,
                            ExecutionErrorKind::InsufficientBalanceExhausted,
                            attempt,
                            source,
                        );
                    }
                    self.report(
                        &current,
                        current.quantity,
                        AttemptOutcome::InsufficientBalance,
                        source,
                    );
                    if cancel.is_cancelled() {
                        info!(symbol = %current.symbol, attempt, "cancelled before retry");
                        return self.fail(
                            &current,
                            current.quantity,
                            ExecutionErrorKind::Cancelled,
                            attempt,
                            source,
                        );
                    }
                    match self.shrink(&current, &rules).await {
                        Ok(smaller) => {
                            debug!(
                                symbol = %current.symbol,
                                from = %current.quantity,
                                to = %smaller.quantity,
                                "shrinking order for retry"
                            );
                            current = smaller;
                        }
                        Err(kind) => {
                            return self.fail(&current, current.quantity, kind, attempt, source)
                        }
                    }
                }
                Err(ExchangeError::Rejected(RejectCode::InvalidParameter)) => {
                    warn!(symbol = %current.symbol, attempt, "order rejected: invalid parameter");
                    return self.fail(
                        &current,
                        current.quantity,
                        ExecutionErrorKind::InvalidParameter,
                        attempt,
                        source,
                    );
                }
                Err(ExchangeError::Rejected(RejectCode::RateLimited)) => {
                    warn!(symbol = %current.symbol, attempt, "order rejected: rate limited");
                    return self.fail(
                        &current,
                        current.quantity,
                        ExecutionErrorKind::RateLimited,
                        attempt,
                        source,
                    );
                }
                Err(ExchangeError::Rejected(code @ RejectCode::Unknown(_))) => {
                    warn!(symbol = %current.symbol, attempt, code = %code, "order rejected");
                    return self.fail(
                        &current,
                        current.quantity,
                        ExecutionErrorKind::Unknown,
                        attempt,
                        source,
                    );
                }
                Err(e @ (ExchangeError::Transport(_) | ExchangeError::Timeout(_))) => {
                    warn!(symbol = %current.symbol, attempt, error = %e, "submit failed on network");
                    return self.fail(
                        &current,
                        current.quantity,
                        ExecutionErrorKind::Network,
                        attempt,
                        source,
                    );
                }
                Err(e @ ExchangeError::MalformedResponse(_)) => {
                    warn!(symbol = %current.symbol, attempt, error = %e, "unparseable venue response");
                    return self.fail(
                        &current,
                        current.quantity,
                        ExecutionErrorKind::Unknown,
                        attempt,
                        source,
                    );
                }
            }
        }

        // new() clamps max_attempts to >= 1, so the loop always returns.
        unreachable!("attempt loop always returns a terminal outcome")
    }

    /// Derive a strictly smaller, still-valid retry request.
    ///
    /// Target quantity is the lesser of the fractional shrink and what the
    /// live balance can actually afford, then re-normalized. Any result
    /// that is not smaller than the last attempt ends the retry loop.
    async fn shrink(
        &self,
        current: &OrderRequest,
        rules: &arb_core::InstrumentRules,
    ) -> Result<OrderRequest, ExecutionErrorKind> {
        let snapshot = match self.oracle.fetch().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(symbol = %current.symbol, error = %e, "balance unavailable during shrink");
                return Err(ExecutionErrorKind::BalanceQuery);
            }
        };

        let price = current.price.reference().inner();
        let cost_per_unit = self.config.cost_per_unit(price);
        if cost_per_unit <= Decimal::ZERO {
            return Err(ExecutionErrorKind::InsufficientBalanceExhausted);
        }
        let affordable = snapshot.available_margin / cost_per_unit;
        let fractional = current.quantity.inner() * self.config.shrink_fraction;
        let target = Size::new(fractional.min(affordable));

        let derived = current.derive_resized(target);
        let normalized = self.normalizer.normalize(&derived, rules).map_err(|e| {
            debug!(symbol = %current.symbol, error = %e, "shrunk order below minimums");
            ExecutionErrorKind::InsufficientBalanceExhausted
        })?;

        if normalized.quantity >= current.quantity {
            // Shrinking made no progress; retrying the same size would loop.
            return Err(ExecutionErrorKind::InsufficientBalanceExhausted);
        }
        Ok(normalized)
    }
}
