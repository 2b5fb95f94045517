//! Core domain types for the arbiter trading bot.
//!
//! This crate provides fundamental types used throughout the trading system:
//! - `Price`, `Size`: precision-safe decimal newtypes
//! - `TradeAction`, `OrderSide`: trading enums
//! - `FeatureVector`: sanitized per-cycle indicator snapshot
//! - `Candidate`, `FinalDecision`: signal arbitration records
//! - `InstrumentRules`, `OrderRequest`: exchange-facing order types

pub mod action;
pub mod candidate;
pub mod decimal;
pub mod error;
pub mod features;
pub mod order;
pub mod rules;

pub use action::{OrderSide, TradeAction};
pub use candidate::{Candidate, FinalDecision, SignalSource};
pub use decimal::{Price, Size};
pub use error::{CoreError, Result};
pub use features::FeatureVector;
pub use order::{ClientOrderId, OrderPrice, OrderRequest};
pub use rules::InstrumentRules;
