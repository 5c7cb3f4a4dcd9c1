//! Product stock records and the clamped decrement rule.

use common::ProductRef;
use serde::{Deserialize, Serialize};

/// Stock state of a catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    pub product_ref: ProductRef,
    pub quantity_on_hand: i64,
    pub disabled: bool,
    pub sold_out: bool,
    /// Category header rows live in the product table but are never sold.
    pub is_category: bool,
}

impl StockRecord {
    pub fn new(product_ref: impl Into<ProductRef>, quantity_on_hand: i64) -> Self {
        Self {
            product_ref: product_ref.into(),
            quantity_on_hand,
            disabled: false,
            sold_out: false,
            is_category: false,
        }
    }

    pub fn category(product_ref: impl Into<ProductRef>) -> Self {
        Self {
            is_category: true,
            ..Self::new(product_ref, 0)
        }
    }

    /// Removes `purchased` units, clamping at zero.
    ///
    /// Reaching zero sets both `disabled` and `sold_out`; any other result
    /// leaves the flags as they were. Category records are not touched and
    /// yield `None`.
    pub fn apply_purchase(&mut self, purchased: u32) -> Option<StockAdjustment> {
        if self.is_category {
            return None;
        }
        let previous = self.quantity_on_hand;
        let remaining = (previous - i64::from(purchased)).max(0);
        self.quantity_on_hand = remaining;
        if remaining == 0 {
            self.disabled = true;
            self.sold_out = true;
        }
        Some(StockAdjustment::new(
            self.product_ref.clone(),
            previous,
            purchased,
            remaining,
        ))
    }
}

/// Outcome of decrementing one product's stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub product_ref: ProductRef,
    pub previous: i64,
    pub remaining: i64,
    /// Units requested beyond what was on hand.
    pub shortfall: i64,
    pub sold_out: bool,
}

impl StockAdjustment {
    pub fn new(product_ref: ProductRef, previous: i64, purchased: u32, remaining: i64) -> Self {
        Self {
            product_ref,
            previous,
            remaining,
            shortfall: (i64::from(purchased) - previous.max(0)).max(0),
            sold_out: remaining == 0,
        }
    }

    pub fn is_oversold(&self) -> bool {
        self.shortfall > 0
    }
}
