//! Exchange error taxonomy.

use thiserror::Error;

/// Classified rejection reason from the exchange.
///
/// Raw venue return codes are mapped here once, at the response boundary,
/// so nothing downstream ever matches on integer codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectCode {
    /// Not enough available margin for the order.
    InsufficientBalance,
    /// The order violated a parameter constraint (step, tick, minimums).
    InvalidParameter,
    /// The venue rate limiter refused the request.
    RateLimited,
    /// Any other rejection, with the raw return code preserved.
    Unknown(i64),
}

impl RejectCode {
    /// Classify a Bybit v5 `retCode`.
    pub fn from_ret_code(code: i64) -> Self {
        match code {
            110007 => Self::InsufficientBalance,
            10001 => Self::InvalidParameter,
            10006 | 10018 => Self::RateLimited,
            other => Self::Unknown(other),
        }
    }
}

impl std::fmt::Display for RejectCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientBalance => write!(f, "insufficient balance"),
            Self::InvalidParameter => write!(f, "invalid parameter"),
            Self::RateLimited => write!(f, "rate limited"),
            Self::Unknown(code) => write!(f, "unknown rejection (retCode {code})"),
        }
    }
}

/// Errors from talking to the exchange.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Network-level failure before a response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request exceeded its deadline.
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The venue responded with something we could not parse.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The venue understood the request and refused it.
    #[error("order rejected: {0}")]
    Rejected(RejectCode),
}

impl ExchangeError {
    /// True for failures where the order may or may not have reached
    /// the venue. These are never blindly retried with the same size.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }
}

/// Both account modes failed during a balance query.
#[derive(Debug, Error)]
#[error("balance query failed on both accounts: primary: {primary}; secondary: {secondary}")]
pub struct BalanceQueryError {
    /// Failure from the unified account query.
    pub primary: ExchangeError,
    /// Failure from the contract account query.
    pub secondary: ExchangeError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ret_code_classification() {
        assert_eq!(
            RejectCode::from_ret_code(110007),
            RejectCode::InsufficientBalance
        );
        assert_eq!(
            RejectCode::from_ret_code(10001),
            RejectCode::InvalidParameter
        );
        assert_eq!(RejectCode::from_ret_code(10006), RejectCode::RateLimited);
        assert_eq!(RejectCode::from_ret_code(10018), RejectCode::RateLimited);
        assert_eq!(RejectCode::from_ret_code(12345), RejectCode::Unknown(12345));
    }

    #[test]
    fn test_network_classification() {
        assert!(ExchangeError::Transport("reset".into()).is_network());
        assert!(ExchangeError::Timeout(std::time::Duration::from_secs(5)).is_network());
        assert!(!ExchangeError::Rejected(RejectCode::RateLimited).is_network());
        assert!(!ExchangeError::MalformedResponse("bad json".into()).is_network());
    }
}
