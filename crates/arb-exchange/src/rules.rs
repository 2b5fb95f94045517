//! Per-instrument trading rules cache.
//!
//! Rules change rarely, so a stale entry is far safer than no entry: when
//! a refresh fails the cache keeps serving the last known rules and logs
//! the staleness instead of blocking order flow.

use crate::client::ExchangeClient;
use crate::error::ExchangeError;
use arb_core::InstrumentRules;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct CachedRules {
    rules: InstrumentRules,
    fetched_at: DateTime<Utc>,
}

/// Cache of instrument rules with refresh-on-expiry and stale-serve.
pub struct ExchangeRules {
    client: Arc<dyn ExchangeClient>,
    cache: DashMap<String, CachedRules>,
    refresh_interval: ChronoDuration,
    // Serializes refreshes so concurrent lookups of an expired symbol
    // produce one fetch, not a stampede.
    refresh_guard: tokio::sync::Mutex<()>,
}

impl ExchangeRules {
    pub fn new(client: Arc<dyn ExchangeClient>, refresh_interval: Duration) -> Self {
        Self {
            client,
            cache: DashMap::new(),
            refresh_interval: ChronoDuration::from_std(refresh_interval)
                .unwrap_or_else(|_| ChronoDuration::hours(1)),
            refresh_guard: tokio::sync::Mutex::new(()),
        }
    }

    /// Get rules for a symbol, fetching or refreshing as needed.
    ///
    /// Returns stale rules (with a warning) when a refresh fails and a
    /// cached entry exists; errors only on a cold miss that also fails
    /// to fetch.
    pub async fn get(&self, symbol: &str) -> Result<InstrumentRules, ExchangeError> {
        if let Some(entry) = self.cache.get(symbol) {
            let age = Utc::now() - entry.fetched_at;
            if age <= self.refresh_interval {
                return Ok(entry.rules.clone());
            }
        }

        let _guard = self.refresh_guard.lock().await;

        // Re-check under the guard; another task may have refreshed.
        if let Some(entry) = self.cache.get(symbol) {
            let age = Utc::now() - entry.fetched_at;
            if age <= self.refresh_interval {
                return Ok(entry.rules.clone());
            }
        }

        match self.client.fetch_instrument_rules(symbol).await {
            Ok(rules) => {
                debug!(%symbol, "instrument rules refreshed");
                self.cache.insert(
                    symbol.to_string(),
                    CachedRules {
                        rules: rules.clone(),
                        fetched_at: Utc::now(),
                    },
                );
                Ok(rules)
            }
            Err(e) => {
                if let Some(entry) = self.cache.get(symbol) {
                    let age = Utc::now() - entry.fetched_at;
                    warn!(
                        %symbol,
                        error = %e,
                        stale_secs = age.num_seconds(),
                        "rules refresh failed, serving stale entry"
                    );
                    Ok(entry.rules.clone())
                } else {
                    warn!(%symbol, error = %e, "rules fetch failed with no cached entry");
                    Err(e)
                }
            }
        }
    }

    /// Age of the cached entry for a symbol, if present.
    pub fn staleness(&self, symbol: &str) -> Option<Duration> {
        self.cache
            .get(symbol)
            .map(|entry| (Utc::now() - entry.fetched_at).to_std().unwrap_or_default())
    }

    /// Pre-populate the cache for a set of symbols at startup.
    pub async fn warm_up(&self, symbols: &[String]) {
        for symbol in symbols {
            match self.get(symbol).await {
                Ok(_) => info!(%symbol, "instrument rules warmed"),
                Err(e) => warn!(%symbol, error = %e, "instrument rules warm-up failed"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockExchangeClient;
    use arb_core::{Price, Size};
    use rust_decimal_macros::dec;

    fn sample_rules() -> InstrumentRules {
        InstrumentRules {
            qty_step: Size::new(dec!(0.01)),
            min_qty: Size::new(dec!(0.01)),
            min_notional: dec!(5),
            price_tick: Price::new(dec!(0.1)),
        }
    }

    #[tokio::test]
    async fn test_cold_miss_fetches_then_serves_cached() {
        let mock = Arc::new(MockExchangeClient::new());
        mock.push_rules(Ok(sample_rules()));

        let cache = ExchangeRules::new(mock.clone(), Duration::from_secs(3600));
        let first = cache.get("BTCUSDT").await.unwrap();
        assert_eq!(first.qty_step, Size::new(dec!(0.01)));

        // Second lookup is served from cache; no scripted result needed.
        let second = cache.get("BTCUSDT").await.unwrap();
        assert_eq!(second, first);
        assert!(cache.staleness("BTCUSDT").is_some());
    }

    #[tokio::test]
    async fn test_stale_served_when_refresh_fails() {
        let mock = Arc::new(MockExchangeClient::new());
        mock.push_rules(Ok(sample_rules()));

        // Zero refresh interval: every lookup after the first is a refresh.
        let cache = ExchangeRules::new(mock.clone(), Duration::ZERO);
        cache.get("BTCUSDT").await.unwrap();

        mock.push_rules(Err(ExchangeError::Transport("down".into())));
        let stale = cache.get("BTCUSDT").await.unwrap();
        assert_eq!(stale, sample_rules());
    }

    #[tokio::test]
    async fn test_cold_miss_failure_is_an_error() {
        let mock = Arc::new(MockExchangeClient::new());
        mock.push_rules(Err(ExchangeError::Transport("down".into())));

        let cache = ExchangeRules::new(mock, Duration::from_secs(3600));
        assert!(cache.get("BTCUSDT").await.is_err());
    }
}
