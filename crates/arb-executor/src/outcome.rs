//! Terminal execution outcomes.

use arb_core::Size;
use arb_exchange::NormalizationError;

/// Why an execution ended without an accepted order.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionErrorKind {
    /// The order could not be normalized against instrument rules.
    Normalization(NormalizationError),
    /// Both balance queries failed during a shrink.
    BalanceQuery,
    /// The venue rejected a parameter; retrying the same order is pointless.
    InvalidParameter,
    /// The venue rate limiter refused the order.
    RateLimited,
    /// Network failure or timeout; the order may or may not have landed.
    Network,
    /// Unclassified venue rejection or malformed response.
    Unknown,
    /// Shrinking could not produce a smaller valid order, or the attempt
    /// budget ran out on insufficient balance.
    InsufficientBalanceExhausted,
    /// Cancellation was requested before a retry.
    Cancelled,
}

/// Result of one execution, covering all submit attempts.
///
/// `attempts_used` counts actual submissions; a request rejected before
/// the first submit (failed normalization, missing rules) reports zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutcome {
    /// Whether an order was accepted by the venue.
    pub accepted: bool,
    /// Exchange-assigned order ID when accepted.
    pub exchange_order_id: Option<String>,
    /// Failure classification when not accepted.
    pub error_kind: Option<ExecutionErrorKind>,
    /// Number of submit attempts made.
    pub attempts_used: u32,
    /// Quantity of the last attempt (accepted quantity on success).
    pub final_quantity: Size,
}

impl ExecutionOutcome {
    pub fn accepted(order_id: String, attempts_used: u32, final_quantity: Size) -> Self {
        Self {
            accepted: true,
            exchange_order_id: Some(order_id),
            error_kind: None,
            attempts_used,
            final_quantity,
        }
    }

    pub fn rejected(kind: ExecutionErrorKind, attempts_used: u32, final_quantity: Size) -> Self {
        Self {
            accepted: false,
            exchange_order_id: None,
            error_kind: Some(kind),
            attempts_used,
            final_quantity,
        }
    }
}
