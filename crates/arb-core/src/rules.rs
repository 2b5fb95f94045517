//! Per-instrument exchange constraints.

use crate::decimal::{Price, Size};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Exchange-side order constraints for one instrument.
///
/// Read-only to all consumers; the rules cache owns the only mutable copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentRules {
    /// Quantity must be an integer multiple of this step.
    pub qty_step: Size,
    /// Minimum order quantity.
    pub min_qty: Size,
    /// Minimum order notional (quantity x price).
    pub min_notional: Decimal,
    /// Limit prices snap to this tick.
    pub price_tick: Price,
}

impl Default for InstrumentRules {
    fn default() -> Self {
        // Typical USDT-perp defaults; real values come from instruments-info.
        Self {
            qty_step: Size::new(Decimal::new(1, 3)),  // 0.001
            min_qty: Size::new(Decimal::new(1, 3)),   // 0.001
            min_notional: Decimal::from(5),           // 5 USDT
            price_tick: Price::new(Decimal::new(1, 2)), // 0.01
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_rules() {
        let rules = InstrumentRules::default();
        assert_eq!(rules.qty_step.inner(), dec!(0.001));
        assert_eq!(rules.min_notional, dec!(5));
    }
}
