//! Order persistence gateway.
//!
//! Writes an order and its lines as two steps. When the second step fails
//! the order row is deleted again, so callers never see an order without
//! its lines.

use common::OrderId;
use domain::{NewOrder, NewOrderLine, Order, OrderLine, OrderStatus, PaymentRefs};
use store::OrderStore;

use crate::error::{CheckoutError, Result};

/// Creates orders, their lines, and moves them between statuses.
#[derive(Debug, Clone)]
pub struct OrderGateway<S> {
    store: S,
}

impl<S: OrderStore> OrderGateway<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Inserts a new order with status `pending`.
    #[tracing::instrument(skip(self, new_order), fields(order_number = %new_order.order_number))]
    pub async fn create_order(&self, new_order: NewOrder) -> Result<Order> {
        let order = new_order.into_order();
        self.store
            .insert_order(&order)
            .await
            .map_err(CheckoutError::Persistence)?;
        tracing::info!(order_id = %order.id, "pending order created");
        Ok(order)
    }

    /// Inserts the lines of a just-created order.
    ///
    /// On failure the order is deleted before the error is returned.
    #[tracing::instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn create_order_lines(
        &self,
        order_id: OrderId,
        lines: Vec<NewOrderLine>,
    ) -> Result<Vec<OrderLine>> {
        let lines: Vec<OrderLine> = lines
            .into_iter()
            .map(|line| line.into_line(order_id))
            .collect();

        if let Err(e) = self.store.insert_order_lines(&lines).await {
            tracing::warn!(error = %e, "order line insert failed, deleting order");
            metrics::counter!("order_compensations_total").increment(1);
            match self.store.delete_order(order_id).await {
                Ok(_) => tracing::info!("order deleted"),
                Err(delete_err) => {
                    tracing::error!(error = %delete_err, "compensating delete failed")
                }
            }
            return Err(CheckoutError::Persistence(e));
        }

        Ok(lines)
    }

    /// Marks an order paid. Calling it again on a paid order is a no-op.
    #[tracing::instrument(skip(self, payment))]
    pub async fn mark_paid(&self, order_id: OrderId, payment: &PaymentRefs) -> Result<Order> {
        let order = self
            .store
            .update_status(order_id, OrderStatus::Paid, Some(payment))
            .await
            .map_err(|e| not_found_or(order_id, e))?;
        tracing::info!(order_number = %order.order_number, "order marked paid");
        Ok(order)
    }

    /// Marks a pending order failed, for reconciling abandoned checkouts.
    #[tracing::instrument(skip(self))]
    pub async fn mark_failed(&self, order_id: OrderId, reason: &str) -> Result<Order> {
        let order = self
            .store
            .update_status(order_id, OrderStatus::Failed, None)
            .await
            .map_err(|e| not_found_or(order_id, e))?;
        tracing::warn!(order_number = %order.order_number, reason, "order marked failed");
        Ok(order)
    }

    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(order_id))
    }

    pub async fn get_order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>> {
        Ok(self.store.get_order_lines(order_id).await?)
    }
}

fn not_found_or(order_id: OrderId, err: store::StoreError) -> CheckoutError {
    match err {
        store::StoreError::OrderNotFound(_) => CheckoutError::OrderNotFound(order_id),
        store::StoreError::Domain(domain_err) => CheckoutError::Validation(domain_err),
        other => CheckoutError::Store(other),
    }
}
