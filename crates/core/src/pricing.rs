//! Checkout pricing policy.
//!
//! Shipping and tax are not part of the cart aggregate; they are derived from
//! a cart's subtotal at checkout time.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::cart::CartState;
use crate::types::Price;

/// Flat sales tax rate applied to the subtotal (8%).
pub const TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

/// Order totals shown at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl OrderSummary {
    /// Price a cart: free shipping, 8% tax rounded to the cent.
    #[must_use]
    pub fn for_cart(cart: &CartState) -> Self {
        Self::for_subtotal(cart.total)
    }

    /// Price an arbitrary subtotal.
    #[must_use]
    pub fn for_subtotal(subtotal: Decimal) -> Self {
        let shipping = Decimal::ZERO;
        let tax = subtotal
            .saturating_mul(TAX_RATE)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        Self {
            subtotal,
            shipping,
            tax,
            total: subtotal.saturating_add(shipping).saturating_add(tax),
        }
    }

    /// Whether shipping is free for this order.
    #[must_use]
    pub fn free_shipping(&self) -> bool {
        self.shipping.is_zero()
    }

    /// Human-readable summary lines, e.g. `("Tax", "$2.40")`.
    #[must_use]
    pub fn display_lines(&self) -> Vec<(&'static str, String)> {
        let shipping = if self.free_shipping() {
            "Free".to_string()
        } else {
            Price::usd(self.shipping).display()
        };

        vec![
            ("Subtotal", Price::usd(self.subtotal).display()),
            ("Shipping", shipping),
            ("Tax", Price::usd(self.tax).display()),
            ("Total", Price::usd(self.total).display()),
        ]
    }
}
