//! Signal generation and arbitration.
//!
//! Five independent rule-based fallback strategies produce one candidate
//! each from a feature snapshot; the arbiter merges them with the optional
//! model recommendation into a single final decision, biased toward HOLD.

pub mod arbiter;
pub mod chain;
pub mod config;
pub mod strategy;

pub use arbiter::SignalArbiter;
pub use chain::FallbackChain;
pub use config::ArbiterConfig;
pub use strategy::FallbackStrategy;
