//! Order request types and identifiers.

use crate::action::OrderSide;
use crate::decimal::{Price, Size};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Client order ID for idempotency.
///
/// Every submission attempt carries a unique cloid so a retried order can
/// never be double-matched against an earlier attempt on the exchange side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientOrderId(String);

impl ClientOrderId {
    /// Create a new unique client order ID.
    ///
    /// Format: `arb_{timestamp_ms}_{uuid_short}`
    pub fn new() -> Self {
        let ts = chrono::Utc::now().timestamp_millis();
        let uuid_short = &Uuid::new_v4().to_string()[..8];
        Self(format!("arb_{ts}_{uuid_short}"))
    }

    /// Create from an existing string (for parsing responses).
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClientOrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ClientOrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Pricing mode of an order.
///
/// Market orders still carry a reference price: the minimum-notional check
/// and the balance-affordability math need one even when the exchange
/// chooses the fill price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderPrice {
    /// Limit order at the given price.
    Limit(Price),
    /// Market order; `reference` is the last observed price.
    Market { reference: Price },
}

impl OrderPrice {
    /// Price used for notional and margin calculations.
    pub fn reference(&self) -> Price {
        match self {
            Self::Limit(p) => *p,
            Self::Market { reference } => *reference,
        }
    }
}

/// A single order submission attempt.
///
/// Requests are never mutated after creation: a retry derives a new request
/// via [`OrderRequest::derive_resized`], preserving the audit trail of
/// attempted quantities and cloids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Instrument symbol (e.g. "BTCUSDT").
    pub symbol: String,
    /// Order side.
    pub side: OrderSide,
    /// Requested quantity.
    pub quantity: Size,
    /// Limit price or market with reference.
    pub price: OrderPrice,
    /// Client order ID, unique per attempt.
    pub cloid: ClientOrderId,
}

impl OrderRequest {
    /// Create a new order request with a fresh cloid.
    pub fn new(symbol: impl Into<String>, side: OrderSide, quantity: Size, price: OrderPrice) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
            price,
            cloid: ClientOrderId::new(),
        }
    }

    /// Derive a retry request with a reduced quantity and a fresh cloid.
    pub fn derive_resized(&self, quantity: Size) -> Self {
        Self {
            symbol: self.symbol.clone(),
            side: self.side,
            quantity,
            price: self.price,
            cloid: ClientOrderId::new(),
        }
    }

    /// Notional value at the reference price.
    pub fn notional(&self) -> rust_decimal::Decimal {
        self.quantity.notional(self.price.reference())
    }
}
