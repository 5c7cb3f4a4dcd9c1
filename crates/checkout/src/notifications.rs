//! Best-effort order emails.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::services::email::{EmailKind, Notifier, OrderEmail};

/// Which of the two emails went out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOutcome {
    pub customer_sent: bool,
    pub operator_sent: bool,
}

/// Sends the customer confirmation and the operator notice.
///
/// Each send is independent; a failure is logged and reported as `false`.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    #[tracing::instrument(skip(self, email), fields(order_number = %email.order_number))]
    pub async fn dispatch(&self, email: &OrderEmail) -> NotificationOutcome {
        let customer_sent = record(
            EmailKind::Customer,
            self.notifier.send_customer_confirmation(email).await,
        );
        let operator_sent = record(
            EmailKind::Operator,
            self.notifier.send_operator_notification(email).await,
        );

        NotificationOutcome {
            customer_sent,
            operator_sent,
        }
    }
}

fn record(kind: EmailKind, result: Result<(), crate::services::email::EmailError>) -> bool {
    match result {
        Ok(()) => {
            metrics::counter!("notifications_sent_total", "kind" => kind.as_str()).increment(1);
            true
        }
        Err(e) => {
            tracing::error!(kind = kind.as_str(), error = %e, "order email failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::email::{EmailItem, InMemoryNotifier};
    use domain::{Money, OrderSummary, PaymentMethodSummary, ShippingProfile};

    fn email() -> OrderEmail {
        OrderEmail {
            order_number: "ORD-240307-1".to_string(),
            items: vec![EmailItem {
                name: "Maroon Clownfish".to_string(),
                quantity: 1,
                unit_price: Money::from_cents(5000),
            }],
            shipping_address: ShippingProfile {
                first_name: "Coral".to_string(),
                last_name: "Diver".to_string(),
                email: Some("coral@example.com".to_string()),
                ..Default::default()
            },
            summary: OrderSummary::from_items([(Money::from_cents(5000), 1)]),
            payment_method: PaymentMethodSummary::fallback(),
        }
    }

    #[tokio::test]
    async fn test_both_sent() {
        let notifier = InMemoryNotifier::new();
        let dispatcher = NotificationDispatcher::new(Arc::new(notifier.clone()));

        let outcome = dispatcher.dispatch(&email()).await;

        assert!(outcome.customer_sent);
        assert!(outcome.operator_sent);
        assert_eq!(notifier.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_customer_failure_does_not_block_operator() {
        let notifier = InMemoryNotifier::new();
        notifier.set_fail_on_customer(true);
        let dispatcher = NotificationDispatcher::new(Arc::new(notifier.clone()));

        let outcome = dispatcher.dispatch(&email()).await;

        assert_eq!(
            outcome,
            NotificationOutcome {
                customer_sent: false,
                operator_sent: true
            }
        );
    }
}
