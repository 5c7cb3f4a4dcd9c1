//! Post-payment stock adjustment.

use domain::{OrderLine, StockAdjustment};
use store::StockStore;

/// Decrements stock for purchased lines.
///
/// Runs after the order is paid, so nothing here can fail the checkout:
/// a line that cannot be adjusted is logged and skipped.
#[derive(Debug, Clone)]
pub struct InventoryAdjuster<S> {
    store: S,
}

impl<S: StockStore> InventoryAdjuster<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Applies every line and returns the adjustments that were made.
    #[tracing::instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn adjust(&self, lines: &[OrderLine]) -> Vec<StockAdjustment> {
        let mut adjustments = Vec::with_capacity(lines.len());

        for line in lines {
            match self
                .store
                .decrement_clamped(&line.product_ref, line.quantity)
                .await
            {
                Ok(Some(adjustment)) => {
                    if adjustment.is_oversold() {
                        tracing::warn!(
                            product = %adjustment.product_ref,
                            requested = line.quantity,
                            previous = adjustment.previous,
                            shortfall = adjustment.shortfall,
                            "product oversold"
                        );
                        metrics::counter!("inventory_oversell_units_total")
                            .increment(adjustment.shortfall.unsigned_abs());
                    }
                    if adjustment.sold_out {
                        tracing::info!(product = %adjustment.product_ref, "product sold out");
                    }
                    adjustments.push(adjustment);
                }
                Ok(None) => {
                    tracing::debug!(product = %line.product_ref, "category record skipped");
                }
                Err(e) => {
                    tracing::error!(
                        product = %line.product_ref,
                        error = %e,
                        "stock adjustment failed"
                    );
                }
            }
        }

        adjustments
    }
}
