//! Exchange client trait.
//!
//! Dyn-compatible async trait over boxed futures so the executor can be
//! tested against a scripted mock without a network.

use crate::balance::AccountMode;
use crate::error::ExchangeError;
use arb_core::{InstrumentRules, OrderRequest};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Acknowledgement of an accepted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitAck {
    /// Exchange-assigned order ID.
    pub order_id: String,
}

/// Abstraction over the exchange API surface the bot needs.
pub trait ExchangeClient: Send + Sync {
    /// Submit one order attempt.
    fn submit_order(
        &self,
        request: &OrderRequest,
    ) -> BoxFuture<'_, Result<SubmitAck, ExchangeError>>;

    /// Query available margin for one account mode.
    fn query_balance(&self, mode: AccountMode) -> BoxFuture<'_, Result<Decimal, ExchangeError>>;

    /// Fetch current trading rules for one instrument.
    fn fetch_instrument_rules(
        &self,
        symbol: &str,
    ) -> BoxFuture<'_, Result<InstrumentRules, ExchangeError>>;
}

/// Arc wrapper for client trait objects.
pub type DynExchangeClient = Arc<dyn ExchangeClient>;

/// Scripted mock client for tests.
///
/// Each call pops the next scripted result; an unscripted call fails
/// loudly so a test can never silently pass on default behavior.
#[derive(Default)]
pub struct MockExchangeClient {
    submits: parking_lot::Mutex<VecDeque<Result<SubmitAck, ExchangeError>>>,
    balances: parking_lot::Mutex<VecDeque<Result<Decimal, ExchangeError>>>,
    rules: parking_lot::Mutex<VecDeque<Result<InstrumentRules, ExchangeError>>>,
    submitted: parking_lot::Mutex<Vec<OrderRequest>>,
    balance_queries: parking_lot::Mutex<Vec<AccountMode>>,
}

impl MockExchangeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next submit result.
    pub fn push_submit(&self, result: Result<SubmitAck, ExchangeError>) {
        self.submits.lock().push_back(result);
    }

    /// Queue the next balance result.
    pub fn push_balance(&self, result: Result<Decimal, ExchangeError>) {
        self.balances.lock().push_back(result);
    }

    /// Queue the next instrument rules result.
    pub fn push_rules(&self, result: Result<InstrumentRules, ExchangeError>) {
        self.rules.lock().push_back(result);
    }

    /// Requests submitted so far, in order.
    pub fn submitted(&self) -> Vec<OrderRequest> {
        self.submitted.lock().clone()
    }

    /// Account modes queried so far, in order.
    pub fn balance_queries(&self) -> Vec<AccountMode> {
        self.balance_queries.lock().clone()
    }
}

impl ExchangeClient for MockExchangeClient {
    fn submit_order(
        &self,
        request: &OrderRequest,
    ) -> BoxFuture<'_, Result<SubmitAck, ExchangeError>> {
        let request = request.clone();
        Box::pin(async move {
            self.submitted.lock().push(request);
            self.submits
                .lock()
                .pop_front()
                .unwrap_or_else(|| panic!("mock: no scripted submit result"))
        })
    }

    fn query_balance(&self, mode: AccountMode) -> BoxFuture<'_, Result<Decimal, ExchangeError>> {
        Box::pin(async move {
            self.balance_queries.lock().push(mode);
            self.balances
                .lock()
                .pop_front()
                .unwrap_or_else(|| panic!("mock: no scripted balance result"))
        })
    }

    fn fetch_instrument_rules(
        &self,
        _symbol: &str,
    ) -> BoxFuture<'_, Result<InstrumentRules, ExchangeError>> {
        Box::pin(async move {
            self.rules
                .lock()
                .pop_front()
                .unwrap_or_else(|| panic!("mock: no scripted rules result"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arb_core::{OrderPrice, OrderSide, Price, Size};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_mock_pops_scripted_results_in_order() {
        let mock = MockExchangeClient::new();
        mock.push_submit(Err(ExchangeError::Rejected(
            crate::error::RejectCode::InsufficientBalance,
        )));
        mock.push_submit(Ok(SubmitAck {
            order_id: "abc".into(),
        }));

        let request = OrderRequest::new(
            "BTCUSDT",
            OrderSide::Buy,
            Size::new(dec!(0.01)),
            OrderPrice::Limit(Price::new(dec!(60000))),
        );

        assert!(mock.submit_order(&request).await.is_err());
        let ack = mock.submit_order(&request).await.unwrap();
        assert_eq!(ack.order_id, "abc");
        assert_eq!(mock.submitted().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_records_balance_modes() {
        let mock = MockExchangeClient::new();
        mock.push_balance(Ok(dec!(1000)));
        mock.push_balance(Ok(dec!(500)));

        mock.query_balance(AccountMode::Unified).await.unwrap();
        mock.query_balance(AccountMode::Contract).await.unwrap();

        assert_eq!(
            mock.balance_queries(),
            vec![AccountMode::Unified, AccountMode::Contract]
        );
    }
}
