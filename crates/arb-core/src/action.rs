//! Trading action and order side enums.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Arbitrated trading action for one evaluation cycle.
///
/// `Hold` is the default: ties and low-confidence states must resolve
/// to it, never to `Buy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl TradeAction {
    /// Returns true for directional actions (`Buy`/`Sell`).
    pub fn is_directional(&self) -> bool {
        !matches!(self, Self::Hold)
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::Hold => write!(f, "HOLD"),
        }
    }
}

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Returns the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

impl TryFrom<TradeAction> for OrderSide {
    type Error = CoreError;

    /// `Hold` has no order side; callers must gate it out before
    /// constructing an order.
    fn try_from(action: TradeAction) -> Result<Self, Self::Error> {
        match action {
            TradeAction::Buy => Ok(Self::Buy),
            TradeAction::Sell => Ok(Self::Sell),
            TradeAction::Hold => Err(CoreError::NotDirectional),
        }
    }
}
