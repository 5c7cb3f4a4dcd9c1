//! Post-commit hooks.
//!
//! Hooks run in order once an order is paid. They see the paid order
//! read-only and may only fill in the display outputs of [`PaidOrder`];
//! an error is logged and counted, and the next hook still runs.

use std::sync::Arc;

use async_trait::async_trait;
use domain::{Order, OrderLine, OrderSummary, PaymentMethodSummary, StockAdjustment};
use store::StockStore;
use thiserror::Error;

use crate::inventory::InventoryAdjuster;
use crate::notifications::{NotificationDispatcher, NotificationOutcome};
use crate::services::email::{EmailItem, OrderEmail};
use crate::services::payment::{PaymentError, PaymentGateway};

/// Errors reported by a post-commit hook.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("Payment lookup failed: {0}")]
    Payment(#[from] PaymentError),

    #[error("Payment method has no card details")]
    NoCardDetails,

    #[error("Notification incomplete: customer_sent={customer_sent} operator_sent={operator_sent}")]
    NotificationIncomplete {
        customer_sent: bool,
        operator_sent: bool,
    },
}

/// A paid order travelling through the hook list.
#[derive(Debug, Clone)]
pub struct PaidOrder {
    order: Order,
    lines: Vec<OrderLine>,
    summary: OrderSummary,
    payment_method_id: Option<String>,
    pub payment_method: PaymentMethodSummary,
    pub adjustments: Vec<StockAdjustment>,
    pub notifications: NotificationOutcome,
}

impl PaidOrder {
    pub fn new(
        order: Order,
        lines: Vec<OrderLine>,
        summary: OrderSummary,
        payment_method_id: Option<String>,
    ) -> Self {
        Self {
            order,
            lines,
            summary,
            payment_method_id,
            payment_method: PaymentMethodSummary::fallback(),
            adjustments: Vec::new(),
            notifications: NotificationOutcome::default(),
        }
    }

    pub fn order(&self) -> &Order {
        &self.order
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn summary(&self) -> &OrderSummary {
        &self.summary
    }

    /// Builds the email payload from the order snapshot.
    pub fn email(&self) -> OrderEmail {
        OrderEmail {
            order_number: self.order.order_number.to_string(),
            items: self
                .lines
                .iter()
                .map(|line| EmailItem {
                    name: line.name.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                })
                .collect(),
            shipping_address: self
                .order
                .shipping_address
                .with_email(self.order.shipping_address.email().or(self.order.guest_email.clone())),
            summary: self.summary,
            payment_method: self.payment_method.clone(),
        }
    }
}

/// One best-effort step after payment.
#[async_trait]
pub trait PostCommitHook: Send + Sync {
    /// Label used in logs and the `hook` metric tag.
    fn name(&self) -> &'static str;

    async fn run(&self, paid: &mut PaidOrder) -> Result<(), HookError>;
}

/// Decrements stock for the purchased lines.
pub struct InventoryHook<S> {
    adjuster: InventoryAdjuster<S>,
}

impl<S> InventoryHook<S> {
    pub fn new(adjuster: InventoryAdjuster<S>) -> Self {
        Self { adjuster }
    }
}

#[async_trait]
impl<S: StockStore> PostCommitHook for InventoryHook<S> {
    fn name(&self) -> &'static str {
        "inventory"
    }

    async fn run(&self, paid: &mut PaidOrder) -> Result<(), HookError> {
        paid.adjustments = self.adjuster.adjust(&paid.lines).await;
        Ok(())
    }
}

/// Looks up the card brand and last four digits for display.
pub struct PaymentMethodHook {
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentMethodHook {
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl PostCommitHook for PaymentMethodHook {
    fn name(&self) -> &'static str {
        "payment_method"
    }

    async fn run(&self, paid: &mut PaidOrder) -> Result<(), HookError> {
        let Some(method_id) = paid.payment_method_id.as_deref() else {
            return Ok(());
        };
        let value = self.gateway.payment_method(method_id).await?;
        paid.payment_method =
            PaymentMethodSummary::from_processor_json(&value).ok_or(HookError::NoCardDetails)?;
        Ok(())
    }
}

/// Sends the customer and operator emails.
pub struct NotificationHook {
    dispatcher: NotificationDispatcher,
}

impl NotificationHook {
    pub fn new(dispatcher: NotificationDispatcher) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl PostCommitHook for NotificationHook {
    fn name(&self) -> &'static str {
        "notifications"
    }

    async fn run(&self, paid: &mut PaidOrder) -> Result<(), HookError> {
        let outcome = self.dispatcher.dispatch(&paid.email()).await;
        paid.notifications = outcome;
        if outcome.customer_sent && outcome.operator_sent {
            Ok(())
        } else {
            Err(HookError::NotificationIncomplete {
                customer_sent: outcome.customer_sent,
                operator_sent: outcome.operator_sent,
            })
        }
    }
}

/// Ordered list of post-commit hooks.
#[derive(Default)]
pub struct PostCommitHooks {
    hooks: Vec<Box<dyn PostCommitHook>>,
}

impl PostCommitHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inventory, then payment-method lookup, then notifications.
    pub fn standard<S>(
        stock: S,
        gateway: Arc<dyn PaymentGateway>,
        dispatcher: NotificationDispatcher,
    ) -> Self
    where
        S: StockStore + 'static,
    {
        Self::new()
            .with(InventoryHook::new(InventoryAdjuster::new(stock)))
            .with(PaymentMethodHook::new(gateway))
            .with(NotificationHook::new(dispatcher))
    }

    pub fn with(mut self, hook: impl PostCommitHook + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    /// Runs every hook. Never fails.
    #[tracing::instrument(skip_all, fields(order_number = %paid.order.order_number))]
    pub async fn run(&self, paid: &mut PaidOrder) {
        for hook in &self.hooks {
            if let Err(e) = hook.run(paid).await {
                tracing::warn!(hook = hook.name(), error = %e, "post-commit hook failed");
                metrics::counter!("post_commit_hook_failures_total", "hook" => hook.name())
                    .increment(1);
            }
        }
    }
}
