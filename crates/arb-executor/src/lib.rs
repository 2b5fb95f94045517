//! Order execution with bounded, balance-aware retries.
//!
//! The executor owns the gap between a normalized order and an exchange
//! acknowledgement: per-symbol mutual exclusion, the shrink-and-retry
//! loop on insufficient balance, and a terminal outcome for every path.

pub mod executor;
pub mod outcome;
pub mod report;

pub use executor::{ExecutorConfig, RetryingExecutor};
pub use outcome::{ExecutionErrorKind, ExecutionOutcome};
pub use report::{AttemptOutcome, ExecutionRecord, LogReporter, Reporter};
