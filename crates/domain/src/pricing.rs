//! Pricing calculator.
//!
//! The same function prices the order when it is persisted and when the
//! confirmation is shown, so the two can never drift.

use serde::{Deserialize, Serialize};

use crate::cart::CartLine;
use crate::money::Money;

/// Sales tax, in percent of the subtotal.
pub const TAX_RATE_PERCENT: i64 = 7;

/// Subtotals strictly above this ship free.
pub const FREE_SHIPPING_THRESHOLD: Money = Money::from_cents(20_000);

/// Shipping charged at or below the threshold.
pub const FLAT_SHIPPING_FEE: Money = Money::from_cents(1_500);

/// Price breakdown of a set of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total: Money,
}

impl OrderSummary {
    /// Prices `(unit_price, quantity)` pairs in order.
    pub fn from_items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = (Money, u32)>,
    {
        let subtotal: Money = items
            .into_iter()
            .map(|(unit_price, quantity)| unit_price.multiply(quantity))
            .sum();
        let tax = subtotal.percent(TAX_RATE_PERCENT);
        let shipping = if subtotal > FREE_SHIPPING_THRESHOLD {
            Money::zero()
        } else {
            FLAT_SHIPPING_FEE
        };

        Self {
            subtotal,
            tax,
            shipping,
            total: subtotal + tax + shipping,
        }
    }

    pub fn for_lines(lines: &[CartLine]) -> Self {
        Self::from_items(lines.iter().map(|line| (line.unit_price, line.quantity)))
    }

    pub fn ships_free(&self) -> bool {
        self.shipping.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_below_threshold_pays_flat_shipping() {
        let summary = OrderSummary::from_items([(Money::from_cents(1000), 3)]);

        assert_eq!(summary.subtotal, Money::from_cents(3000));
        assert_eq!(summary.shipping, Money::from_cents(1500));
        assert_eq!(summary.tax, Money::from_cents(210));
        assert_eq!(summary.total, Money::from_cents(4710));
    }

    #[test]
    fn test_above_threshold_ships_free() {
        let summary = OrderSummary::from_items([(Money::from_cents(25_000), 1)]);

        assert!(summary.ships_free());
        assert_eq!(summary.tax, Money::from_cents(1750));
        assert_eq!(summary.total, Money::from_cents(26_750));
    }

    #[test]
    fn test_exactly_threshold_still_pays_shipping() {
        let summary = OrderSummary::from_items([(Money::from_cents(10_000), 2)]);
        assert_eq!(summary.shipping, FLAT_SHIPPING_FEE);
        assert_eq!(summary.total, Money::from_cents(20_000 + 1_400 + 1_500));
    }

    #[test]
    fn test_total_is_sum_of_parts_for_many_carts() {
        for cents in [0_i64, 1, 99, 1999, 20_000, 20_001, 123_457] {
            for quantity in 1..4 {
                let s = OrderSummary::from_items([(Money::from_cents(cents), quantity)]);
                assert_eq!(s.total, s.subtotal + s.tax + s.shipping);
                assert_eq!(s.tax, s.subtotal.percent(7));
                assert_eq!(s.shipping.is_zero(), s.subtotal > FREE_SHIPPING_THRESHOLD);
            }
        }
    }

    #[test]
    fn test_lines_and_items_price_identically() {
        let lines = vec![
            CartLine::new("a", "Blue Tang", Money::from_cents(4500), 2),
            CartLine::new("b", "Bubble Tip Anemone", Money::from_cents(6000), 1),
        ];
        let from_lines = OrderSummary::for_lines(&lines);
        let from_items = OrderSummary::from_items([
            (Money::from_cents(4500), 2),
            (Money::from_cents(6000), 1),
        ]);
        assert_eq!(from_lines, from_items);
    }
}
