//! Balance oracle with account-mode fallback.
//!
//! Modern venue accounts expose margin through a unified account; older
//! ones only answer on the contract account. The oracle tries unified
//! first, falls back to contract exactly once, and tags each snapshot
//! with the mode that answered so the caller can see which path was hot.

use crate::client::ExchangeClient;
use crate::error::BalanceQueryError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Which account answered a balance query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountMode {
    /// Unified trading account (primary).
    Unified,
    /// Legacy contract account (fallback).
    Contract,
}

impl AccountMode {
    /// Wire value for the venue's `accountType` parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unified => "UNIFIED",
            Self::Contract => "CONTRACT",
        }
    }
}

impl std::fmt::Display for AccountMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observed balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceSnapshot {
    /// Available margin in the settlement currency.
    pub available_margin: Decimal,
    /// Account that answered.
    pub account_mode: AccountMode,
    /// When the query completed.
    pub fetched_at: DateTime<Utc>,
}

/// Queries available margin with unified-then-contract fallback.
pub struct BalanceOracle {
    client: Arc<dyn ExchangeClient>,
}

impl BalanceOracle {
    pub fn new(client: Arc<dyn ExchangeClient>) -> Self {
        Self { client }
    }

    /// Fetch the current available margin.
    ///
    /// The contract account is tried at most once, and only after the
    /// unified query has failed. Both failures are reported together.
    pub async fn fetch(&self) -> Result<BalanceSnapshot, BalanceQueryError> {
        let primary_err = match self.client.query_balance(AccountMode::Unified).await {
            Ok(available_margin) => {
                debug!(%available_margin, mode = %AccountMode::Unified, "balance fetched");
                return Ok(BalanceSnapshot {
                    available_margin,
                    account_mode: AccountMode::Unified,
                    fetched_at: Utc::now(),
                });
            }
            Err(e) => e,
        };

        warn!(error = %primary_err, "unified balance query failed, falling back to contract");

        match self.client.query_balance(AccountMode::Contract).await {
            Ok(available_margin) => {
                debug!(%available_margin, mode = %AccountMode::Contract, "balance fetched");
                Ok(BalanceSnapshot {
                    available_margin,
                    account_mode: AccountMode::Contract,
                    fetched_at: Utc::now(),
                })
            }
            Err(secondary_err) => {
                error!(
                    primary = %primary_err,
                    secondary = %secondary_err,
                    "balance query failed on both account modes"
                );
                Err(BalanceQueryError {
                    primary: primary_err,
                    secondary: secondary_err,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockExchangeClient;
    use crate::error::ExchangeError;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_unified_success_skips_contract() {
        let mock = Arc::new(MockExchangeClient::new());
        mock.push_balance(Ok(dec!(1500)));

        let oracle = BalanceOracle::new(mock.clone());
        let snapshot = oracle.fetch().await.unwrap();

        assert_eq!(snapshot.available_margin, dec!(1500));
        assert_eq!(snapshot.account_mode, AccountMode::Unified);
        assert_eq!(mock.balance_queries(), vec![AccountMode::Unified]);
    }

    #[tokio::test]
    async fn test_contract_fallback_once() {
        let mock = Arc::new(MockExchangeClient::new());
        mock.push_balance(Err(ExchangeError::Transport("reset".into())));
        mock.push_balance(Ok(dec!(800)));

        let oracle = BalanceOracle::new(mock.clone());
        let snapshot = oracle.fetch().await.unwrap();

        assert_eq!(snapshot.available_margin, dec!(800));
        assert_eq!(snapshot.account_mode, AccountMode::Contract);
        assert_eq!(
            mock.balance_queries(),
            vec![AccountMode::Unified, AccountMode::Contract]
        );
    }

    #[tokio::test]
    async fn test_both_failures_reported_together() {
        let mock = Arc::new(MockExchangeClient::new());
        mock.push_balance(Err(ExchangeError::Transport("reset".into())));
        mock.push_balance(Err(ExchangeError::Timeout(
            std::time::Duration::from_secs(5),
        )));

        let oracle = BalanceOracle::new(mock.clone());
        let err = oracle.fetch().await.unwrap_err();

        assert!(matches!(err.primary, ExchangeError::Transport(_)));
        assert!(matches!(err.secondary, ExchangeError::Timeout(_)));
        // Exactly one fallback attempt, never more
        assert_eq!(mock.balance_queries().len(), 2);
    }
}
