//! Human-readable order numbers backed by a store sequence.

use chrono::{NaiveDate, Utc};
use domain::{ORDER_NUMBER_SEQUENCE, OrderNumber};
use store::SequenceStore;

use crate::error::{CheckoutError, Result};

/// Allocates `ORD-YYMMDD-{seq}` numbers from the `order_number` sequence.
#[derive(Debug, Clone)]
pub struct OrderNumberGenerator<S> {
    store: S,
}

impl<S: SequenceStore> OrderNumberGenerator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Allocates the next order number, dated today (UTC).
    pub async fn next(&self) -> Result<OrderNumber> {
        self.next_on(Utc::now().date_naive()).await
    }

    /// Allocates the next order number for a given date.
    #[tracing::instrument(skip(self))]
    pub async fn next_on(&self, date: NaiveDate) -> Result<OrderNumber> {
        let sequence = self
            .store
            .next_value(ORDER_NUMBER_SEQUENCE)
            .await
            .map_err(CheckoutError::OrderNumber)?;
        let number = OrderNumber::format(date, sequence);
        tracing::debug!(order_number = %number, "order number allocated");
        Ok(number)
    }
}
