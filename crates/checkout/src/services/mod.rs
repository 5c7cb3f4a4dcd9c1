//! Clients for the remote services a checkout calls out to.

pub mod email;
pub mod payment;
pub mod stripe;

pub use email::{
    EmailError, EmailItem, EmailKind, EmailSettings, InMemoryNotifier, Notifier, OrderEmail,
    SentEmail, SmtpNotifier,
};
pub use payment::{
    InMemoryPaymentGateway, IntentStatus, PaymentError, PaymentGateway, PaymentIntent,
};
pub use stripe::{StripeGateway, StripeSettings};
