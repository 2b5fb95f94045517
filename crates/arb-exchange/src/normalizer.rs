//! Order normalization against instrument rules.

use arb_core::{InstrumentRules, OrderPrice, OrderRequest};
use thiserror::Error;

/// An order that cannot be made valid by normalization.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizationError {
    /// Snapped quantity is below the instrument minimum.
    #[error("quantity {quantity} below minimum {min_qty}")]
    BelowMinimumQuantity { quantity: String, min_qty: String },

    /// Notional at the reference price is below the instrument minimum.
    #[error("notional {notional} below minimum {min_notional}")]
    BelowMinimumNotional {
        notional: String,
        min_notional: String,
    },
}

/// Snaps orders onto the instrument grid.
///
/// Pure and idempotent: quantities round DOWN to the step (never up, a
/// larger order than intended is worse than a smaller one), limit prices
/// round to the nearest tick, and an already-normalized request passes
/// through unchanged. Orders that land below the minimums are rejected
/// rather than bumped up.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrderNormalizer;

impl OrderNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize one request against the instrument rules.
    pub fn normalize(
        &self,
        request: &OrderRequest,
        rules: &InstrumentRules,
    ) -> Result<OrderRequest, NormalizationError> {
        let quantity = request.quantity.round_to_step(rules.qty_step);

        if quantity < rules.min_qty {
            return Err(NormalizationError::BelowMinimumQuantity {
                quantity: quantity.inner().to_string(),
                min_qty: rules.min_qty.inner().to_string(),
            });
        }

        let notional = quantity.notional(request.price.reference());
        if notional < rules.min_notional {
            return Err(NormalizationError::BelowMinimumNotional {
                notional: notional.to_string(),
                min_notional: rules.min_notional.to_string(),
            });
        }

        let price = match request.price {
            OrderPrice::Limit(p) => OrderPrice::Limit(p.round_to_tick_nearest(rules.price_tick)),
            market @ OrderPrice::Market { .. } => market,
        };

        let mut normalized = request.clone();
        normalized.quantity = quantity;
        normalized.price = price;
        Ok(normalized)
    }
}
