//! Exchange connectivity and the order safety layer.
//!
//! Everything between a final trading decision and the wire lives here:
//! the client trait and its REST implementation, per-instrument rule
//! caching, order normalization against those rules, and the balance
//! oracle with its primary/fallback account classification.

pub mod balance;
pub mod client;
pub mod error;
pub mod normalizer;
pub mod rest;
pub mod rules;

pub use balance::{AccountMode, BalanceOracle, BalanceSnapshot};
pub use client::{BoxFuture, DynExchangeClient, ExchangeClient, MockExchangeClient, SubmitAck};
pub use error::{BalanceQueryError, ExchangeError, RejectCode};
pub use normalizer::{NormalizationError, OrderNormalizer};
pub use rest::{ApiCredentials, RestExchangeClient};
pub use rules::ExchangeRules;
