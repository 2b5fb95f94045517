//! Application wiring and the trading loop.

use crate::config::{AppConfig, SymbolConfig};
use crate::error::AppResult;
use arb_core::{Candidate, FeatureVector, OrderPrice, OrderRequest, OrderSide, Price, Size};
use arb_exchange::{
    ApiCredentials, BoxFuture, ExchangeClient, ExchangeRules, RestExchangeClient,
};
use arb_executor::{LogReporter, RetryingExecutor};
use arb_signal::{FallbackChain, SignalArbiter};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One market observation: features plus the price they were computed at.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub features: FeatureVector,
    pub last_price: Price,
}

/// Source of per-symbol feature snapshots.
pub trait FeatureSource: Send + Sync {
    fn snapshot(&self, symbol: &str) -> BoxFuture<'_, anyhow::Result<MarketSnapshot>>;
}

/// Optional model producing a scored candidate.
pub trait ModelScorer: Send + Sync {
    fn score(
        &self,
        symbol: &str,
        features: &FeatureVector,
    ) -> BoxFuture<'_, anyhow::Result<Option<Candidate>>>;
}

/// Scorer used when no model is deployed; arbitration runs on fallbacks only.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullModelScorer;

impl ModelScorer for NullModelScorer {
    fn score(
        &self,
        _symbol: &str,
        _features: &FeatureVector,
    ) -> BoxFuture<'_, anyhow::Result<Option<Candidate>>> {
        Box::pin(async { Ok(None) })
    }
}

/// The assembled bot.
pub struct Application {
    config: AppConfig,
    chain: FallbackChain,
    arbiter: SignalArbiter,
    executor: RetryingExecutor,
    rules: Arc<ExchangeRules>,
    features: Arc<dyn FeatureSource>,
    scorer: Arc<dyn ModelScorer>,
    cancel: CancellationToken,
}

impl Application {
    /// Build against the live REST venue.
    pub fn new(
        config: AppConfig,
        features: Arc<dyn FeatureSource>,
        scorer: Arc<dyn ModelScorer>,
        cancel: CancellationToken,
    ) -> AppResult<Self> {
        let client = Arc::new(RestExchangeClient::new(
            config.venue.base_url.clone(),
            ApiCredentials {
                api_key: config.venue.api_key.clone(),
                api_secret: config.venue.api_secret.clone(),
            },
        )?);
        Ok(Self::with_client(config, client, features, scorer, cancel))
    }

    /// Build against an arbitrary client implementation.
    pub fn with_client(
        config: AppConfig,
        client: Arc<dyn ExchangeClient>,
        features: Arc<dyn FeatureSource>,
        scorer: Arc<dyn ModelScorer>,
        cancel: CancellationToken,
    ) -> Self {
        let rules = Arc::new(ExchangeRules::new(
            client.clone(),
            Duration::from_secs(config.rules_refresh_secs),
        ));
        let executor = RetryingExecutor::new(
            client,
            rules.clone(),
            Arc::new(LogReporter),
            config.executor.clone(),
        );
        Self {
            arbiter: SignalArbiter::new(config.arbiter.clone()),
            chain: FallbackChain::new(),
            executor,
            rules,
            config,
            features,
            scorer,
            cancel,
        }
    }

    /// Run decision cycles until cancelled.
    pub async fn run(&self) -> AppResult<()> {
        info!(
            mode = ?self.config.mode,
            symbols = self.config.symbols.len(),
            interval_secs = self.config.cycle_interval_secs,
            "trading loop started"
        );

        if !self.config.is_observation_mode() {
            let symbols: Vec<String> = self
                .config
                .symbols
                .iter()
                .map(|s| s.symbol.clone())
                .collect();
            self.rules.warm_up(&symbols).await;
        }

        let mut interval =
            tokio::time::interval(Duration::from_secs(self.config.cycle_interval_secs));

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.run_cycle().await;
                }
                _ = self.cancel.cancelled() => {
                    info!("shutdown requested, stopping trading loop");
                    break;
                }
            }
        }
        Ok(())
    }

    /// One decision cycle across all configured symbols.
    ///
    /// A failure for one symbol never aborts the cycle or the process.
    pub async fn run_cycle(&self) {
        for symbol_config in &self.config.symbols {
            if self.cancel.is_cancelled() {
                return;
            }
            self.process_symbol(symbol_config).await;
        }
    }

    async fn process_symbol(&self, symbol_config: &SymbolConfig) {
        let symbol = symbol_config.symbol.as_str();

        let snapshot = match self.features.snapshot(symbol).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(%symbol, error = %e, "feature snapshot unavailable, skipping");
                return;
            }
        };

        let fallbacks = self.chain.evaluate(&snapshot.features);

        // A model failure degrades to fallback-only arbitration.
        let model = match self.scorer.score(symbol, &snapshot.features).await {
            Ok(model) => model,
            Err(e) => {
                warn!(%symbol, error = %e, "model scoring failed, using fallbacks only");
                None
            }
        };

        let decision = self.arbiter.decide(model.as_ref(), &fallbacks);

        // HOLD never reaches the executor.
        if !decision.is_actionable() {
            debug!(%symbol, "decision: hold");
            return;
        }

        info!(
            %symbol,
            action = ?decision.action,
            source = ?decision.source,
            strength = decision.strength,
            "directional decision"
        );

        if self.config.is_observation_mode() {
            info!(%symbol, action = ?decision.action, "observation mode, not submitting");
            return;
        }

        let side = match OrderSide::try_from(decision.action) {
            Ok(side) => side,
            Err(e) => {
                warn!(%symbol, error = %e, "decision has no order side");
                return;
            }
        };

        let request = OrderRequest::new(
            symbol,
            side,
            Size::new(symbol_config.order_quantity),
            OrderPrice::Market {
                reference: snapshot.last_price,
            },
        );

        let outcome = self
            .executor
            .execute(request, decision.source, &self.cancel)
            .await;
        if outcome.accepted {
            info!(
                %symbol,
                order_id = outcome.exchange_order_id.as_deref().unwrap_or(""),
                attempts = outcome.attempts_used,
                qty = %outcome.final_quantity,
                "order placed"
            );
        } else {
            warn!(
                %symbol,
                error = ?outcome.error_kind,
                attempts = outcome.attempts_used,
                "order not placed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OperatingMode;
    use arb_core::features::names;
    use arb_core::InstrumentRules;
    use arb_exchange::{MockExchangeClient, SubmitAck};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    struct ScriptedFeatureSource {
        features: Vec<(&'static str, f64)>,
    }

    impl FeatureSource for ScriptedFeatureSource {
        fn snapshot(&self, _symbol: &str) -> BoxFuture<'_, anyhow::Result<MarketSnapshot>> {
            let features = FeatureVector::new(
                self.features
                    .iter()
                    .map(|(k, v)| (k.to_string(), *v))
                    .collect::<HashMap<_, _>>(),
            );
            Box::pin(async move {
                Ok(MarketSnapshot {
                    features,
                    last_price: Price::new(dec!(60000)),
                })
            })
        }
    }

    fn config(mode: OperatingMode) -> AppConfig {
        AppConfig {
            mode,
            symbols: vec![crate::config::SymbolConfig {
                symbol: "BTCUSDT".into(),
                order_quantity: dec!(0.012),
            }],
            ..Default::default()
        }
    }

    fn app(
        mode: OperatingMode,
        mock: Arc<MockExchangeClient>,
        features: Vec<(&'static str, f64)>,
    ) -> Application {
        Application::with_client(
            config(mode),
            mock,
            Arc::new(ScriptedFeatureSource { features }),
            Arc::new(NullModelScorer),
            CancellationToken::new(),
        )
    }

    fn directional_features() -> Vec<(&'static str, f64)> {
        vec![
            (names::GOLDEN_CROSS, 1.0),
            (names::MOMENTUM, 0.5),
            (names::RSI, 60.0),
        ]
    }

    #[tokio::test]
    async fn test_hold_never_reaches_executor() {
        let mock = Arc::new(MockExchangeClient::new());
        // Neutral features: every strategy holds; no rules or submits scripted,
        // so any executor call would panic the mock.
        let app = app(OperatingMode::Trading, mock.clone(), vec![]);
        app.run_cycle().await;
        assert!(mock.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_observation_mode_never_submits() {
        let mock = Arc::new(MockExchangeClient::new());
        let app = app(OperatingMode::Observation, mock.clone(), directional_features());
        app.run_cycle().await;
        assert!(mock.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_trading_mode_submits_directional_decision() {
        let mock = Arc::new(MockExchangeClient::new());
        mock.push_rules(Ok(InstrumentRules::default()));
        mock.push_submit(Ok(SubmitAck {
            order_id: "oid-1".into(),
        }));

        let app = app(OperatingMode::Trading, mock.clone(), directional_features());
        app.run_cycle().await;

        let submitted = mock.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].symbol, "BTCUSDT");
        assert_eq!(submitted[0].side, OrderSide::Buy);
        assert_eq!(submitted[0].quantity, Size::new(dec!(0.012)));
    }

    #[tokio::test]
    async fn test_feature_failure_skips_symbol() {
        struct FailingSource;
        impl FeatureSource for FailingSource {
            fn snapshot(&self, _symbol: &str) -> BoxFuture<'_, anyhow::Result<MarketSnapshot>> {
                Box::pin(async { Err(anyhow::anyhow!("feed down")) })
            }
        }

        let mock = Arc::new(MockExchangeClient::new());
        let app = Application::with_client(
            config(OperatingMode::Trading),
            mock.clone(),
            Arc::new(FailingSource),
            Arc::new(NullModelScorer),
            CancellationToken::new(),
        );
        // Must not panic or submit
        app.run_cycle().await;
        assert!(mock.submitted().is_empty());
    }
}
