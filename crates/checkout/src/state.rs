//! Checkout state machine.
//!
//! Pure transition rules only; the orchestrator performs the side effects.

use serde::{Deserialize, Serialize};

use crate::error::CheckoutError;

/// The step a checkout session is on.
///
/// State transitions:
/// ```text
/// Shipping ──┬──► Account ──► Payment ──► Confirmation
///            └──────────────► Payment
/// ```
/// `Account` is only visited by buyers who are not signed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    #[default]
    Shipping,
    Account,
    Payment,
    /// Terminal.
    Confirmation,
}

impl CheckoutStep {
    pub fn can_submit_shipping(&self) -> bool {
        matches!(self, CheckoutStep::Shipping)
    }

    pub fn can_choose_account(&self) -> bool {
        matches!(self, CheckoutStep::Account)
    }

    pub fn can_pay(&self) -> bool {
        matches!(self, CheckoutStep::Payment)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckoutStep::Confirmation)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutStep::Shipping => "shipping",
            CheckoutStep::Account => "account",
            CheckoutStep::Payment => "payment",
            CheckoutStep::Confirmation => "confirmation",
        }
    }
}

impl std::fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Something that moves a checkout between steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutEvent {
    /// Shipping details were valid and no sign-in offer is pending.
    ShippingAccepted { authenticated: bool },
    /// The shipping email belongs to an account; the buyer stays on shipping.
    SignInOffered,
    /// The buyer accepted the sign-in offer.
    SignedIn,
    /// The buyer declined the sign-in offer.
    SignInDeclined,
    AccountCreated,
    ContinuedAsGuest,
    PaymentSucceeded,
    Back { authenticated: bool },
}

impl CheckoutEvent {
    fn action(&self) -> &'static str {
        match self {
            CheckoutEvent::ShippingAccepted { .. } => "accept shipping",
            CheckoutEvent::SignInOffered => "offer sign-in",
            CheckoutEvent::SignedIn => "sign in",
            CheckoutEvent::SignInDeclined => "decline sign-in",
            CheckoutEvent::AccountCreated => "create account",
            CheckoutEvent::ContinuedAsGuest => "continue as guest",
            CheckoutEvent::PaymentSucceeded => "complete payment",
            CheckoutEvent::Back { .. } => "go back",
        }
    }
}

/// Returns the step after applying `event` to `step`.
pub fn transition(step: CheckoutStep, event: CheckoutEvent) -> Result<CheckoutStep, CheckoutError> {
    use CheckoutEvent as E;
    use CheckoutStep as S;

    let next = match (step, event) {
        (S::Shipping, E::ShippingAccepted { authenticated: true }) => S::Payment,
        (S::Shipping, E::ShippingAccepted { authenticated: false }) => S::Account,
        (S::Shipping, E::SignInOffered) => S::Shipping,
        (S::Shipping, E::SignedIn) => S::Payment,
        (S::Shipping, E::SignInDeclined) => S::Account,
        (S::Account, E::AccountCreated | E::ContinuedAsGuest) => S::Payment,
        (S::Payment, E::PaymentSucceeded) => S::Confirmation,
        (S::Payment, E::Back { authenticated: true }) => S::Shipping,
        (S::Payment, E::Back { authenticated: false }) => S::Account,
        (S::Account, E::Back { .. }) => S::Shipping,
        _ => {
            return Err(CheckoutError::InvalidTransition {
                step,
                action: event.action(),
            });
        }
    };
    Ok(next)
}
