//! Checkout error types.

use common::{CartId, OrderId, SessionId};
use domain::DomainError;
use store::StoreError;
use thiserror::Error;

use crate::services::payment::PaymentError;
use crate::state::CheckoutStep;

/// Errors that can occur while driving a checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Input rejected before any side effect.
    #[error("Validation failed: {0}")]
    Validation(#[from] DomainError),

    /// The requested move is not allowed from the current step.
    #[error("Invalid checkout transition: cannot {action} from {step} step")]
    InvalidTransition {
        step: CheckoutStep,
        action: &'static str,
    },

    /// No checkout session with this id.
    #[error("Checkout session not found: {0}")]
    SessionNotFound(SessionId),

    /// No cart with this id.
    #[error("Cart not found: {0}")]
    CartNotFound(CartId),

    /// No order with this id.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order number could not be allocated; nothing was written.
    #[error("Could not allocate order number: {0}")]
    OrderNumber(#[source] StoreError),

    /// The order or its lines could not be persisted; any partial order was removed.
    #[error("Could not save order: {0}")]
    Persistence(#[source] StoreError),

    /// Payment intent creation or verification failed.
    #[error("Payment failed: {0}")]
    Payment(#[from] PaymentError),

    /// The payment intent exists but has not succeeded.
    #[error("Payment not confirmed: intent {intent_id} is {status}")]
    PaymentNotConfirmed { intent_id: String, status: String },

    /// `submit_payment` was called before a payment intent was created.
    #[error("No payment intent for this checkout")]
    MissingPaymentIntent,

    /// The email belongs to an account that is not the current buyer.
    #[error("Account already exists for {0}")]
    AccountExists(String),

    /// Any other store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl CheckoutError {
    /// Returns true if the buyer can retry the same step.
    pub fn is_retryable(&self) -> bool {
        match self {
            CheckoutError::OrderNumber(_) | CheckoutError::Persistence(_) => true,
            CheckoutError::Store(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// Short label used for the `reason` metric tag.
    pub fn reason(&self) -> &'static str {
        match self {
            CheckoutError::Validation(_) => "validation",
            CheckoutError::InvalidTransition { .. } => "invalid_transition",
            CheckoutError::SessionNotFound(_)
            | CheckoutError::CartNotFound(_)
            | CheckoutError::OrderNotFound(_) => "not_found",
            CheckoutError::OrderNumber(_) => "order_number",
            CheckoutError::Persistence(_) => "persistence",
            CheckoutError::Payment(_)
            | CheckoutError::PaymentNotConfirmed { .. }
            | CheckoutError::MissingPaymentIntent => "payment",
            CheckoutError::AccountExists(_) => "account_exists",
            CheckoutError::Store(_) => "store",
        }
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
