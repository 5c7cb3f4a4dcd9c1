//! Checkout orchestration for the storefront.
//!
//! A checkout moves through shipping → account → payment → confirmation.
//! Submitting payment runs a chain of remote calls:
//! 1. Allocate an order number
//! 2. Create the order (pending) and its lines, deleting the order if the lines fail
//! 3. Verify the payment intent succeeded and mark the order paid
//! 4. Run the post-commit hooks (inventory, card lookup, emails)
//!
//! Nothing after step 3 can fail the checkout.

pub mod error;
pub mod gateway;
pub mod hooks;
pub mod inventory;
pub mod notifications;
pub mod orchestrator;
pub mod order_number;
pub mod services;
pub mod session;
pub mod state;

pub use error::{CheckoutError, Result};
pub use gateway::OrderGateway;
pub use hooks::{HookError, PaidOrder, PostCommitHook, PostCommitHooks};
pub use inventory::InventoryAdjuster;
pub use notifications::{NotificationDispatcher, NotificationOutcome};
pub use orchestrator::{
    AccountChoice, CheckoutOrchestrator, OrderDetails, PaymentSubmission, ShippingSubmission,
};
pub use order_number::OrderNumberGenerator;
pub use services::{
    EmailError, EmailItem, EmailKind, EmailSettings, InMemoryNotifier, InMemoryPaymentGateway,
    IntentStatus, Notifier, OrderEmail, PaymentError, PaymentGateway, PaymentIntent, SentEmail,
    SmtpNotifier, StripeGateway, StripeSettings,
};
pub use session::{CheckoutSession, Confirmation, PendingOrder, SignInOffer};
pub use state::{CheckoutEvent, CheckoutStep};
