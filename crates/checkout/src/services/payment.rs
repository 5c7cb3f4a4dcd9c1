//! Payment processor trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::Money;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when talking to the payment processor.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The processor returned an error response.
    #[error("Processor error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Amounts must be positive.
    #[error("Invalid amount: {0}")]
    InvalidAmount(Money),

    /// Unknown payment intent.
    #[error("Payment intent not found: {0}")]
    IntentNotFound(String),

    /// Unknown payment method.
    #[error("Payment method not found: {0}")]
    MethodNotFound(String),

    /// Failed to parse a processor response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The processor could not be reached.
    #[error("Payment service unavailable: {0}")]
    Unavailable(String),

    /// An intent or payment-method id that cannot name a processor object.
    #[error("Invalid processor id: {0:?}")]
    InvalidId(String),
}

/// Checks that `id` can name a processor object.
///
/// Ids are interpolated into request paths, so only ASCII alphanumerics and
/// `_` are accepted. Anything else (`/`, `.`, `?`, `%`) could address a
/// different resource with the secret key attached.
pub fn validate_object_id(id: &str) -> Result<(), PaymentError> {
    let valid = !id.is_empty()
        && id.len() <= 255
        && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(PaymentError::InvalidId(id.to_string()))
    }
}

/// Lifecycle status of a payment intent, as reported by the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    #[serde(other)]
    Unknown,
}

impl IntentStatus {
    /// Only a succeeded intent lets an order become paid.
    pub fn is_succeeded(&self) -> bool {
        matches!(self, IntentStatus::Succeeded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentStatus::RequiresPaymentMethod => "requires_payment_method",
            IntentStatus::RequiresConfirmation => "requires_confirmation",
            IntentStatus::RequiresAction => "requires_action",
            IntentStatus::Processing => "processing",
            IntentStatus::RequiresCapture => "requires_capture",
            IntentStatus::Canceled => "canceled",
            IntentStatus::Succeeded => "succeeded",
            IntentStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A payment intent created for one checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Handed to the client SDK, which confirms the buyer's instrument.
    #[serde(default)]
    pub client_secret: String,
    /// Amount in minor units.
    pub amount: Money,
    pub status: IntentStatus,
    /// Payment method attached on confirmation, if any.
    #[serde(default)]
    pub payment_method: Option<String>,
}

/// Trait for payment processor operations.
///
/// Card data never reaches this service: the client confirms the intent,
/// the server only creates it and later verifies its status.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a payment intent for `amount` in USD with automatic payment methods.
    async fn create_intent(&self, amount: Money) -> Result<PaymentIntent, PaymentError>;

    /// Retrieves an intent to check its status.
    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError>;

    /// Retrieves the processor's payment-method resource as raw JSON.
    async fn payment_method(&self, method_id: &str) -> Result<serde_json::Value, PaymentError>;
}

#[async_trait]
impl<T: PaymentGateway + ?Sized> PaymentGateway for Arc<T> {
    async fn create_intent(&self, amount: Money) -> Result<PaymentIntent, PaymentError> {
        (**self).create_intent(amount).await
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError> {
        (**self).retrieve_intent(intent_id).await
    }

    async fn payment_method(&self, method_id: &str) -> Result<serde_json::Value, PaymentError> {
        (**self).payment_method(method_id).await
    }
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    intents: HashMap<String, PaymentIntent>,
    methods: HashMap<String, serde_json::Value>,
    next_id: u32,
    auto_confirm: bool,
    fail_on_create: bool,
    fail_on_retrieve: bool,
}

/// In-memory payment processor for testing.
///
/// Intents start in `requires_payment_method`; call [`confirm`](Self::confirm)
/// to play the part of the client SDK, or enable auto-confirmation.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryPaymentState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory payment gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks new intents as succeeded as soon as they are created.
    pub fn set_auto_confirm(&self, auto_confirm: bool) {
        self.state.write().unwrap().auto_confirm = auto_confirm;
    }

    /// Configures the gateway to fail on create calls.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    /// Configures the gateway to fail on retrieve calls.
    pub fn set_fail_on_retrieve(&self, fail: bool) {
        self.state.write().unwrap().fail_on_retrieve = fail;
    }

    /// Confirms an intent with a payment method, as the client SDK would.
    pub fn confirm(&self, intent_id: &str, method_id: Option<&str>) {
        let mut state = self.state.write().unwrap();
        if let Some(intent) = state.intents.get_mut(intent_id) {
            intent.status = IntentStatus::Succeeded;
            intent.payment_method = method_id.map(str::to_string);
        }
    }

    /// Declines an intent.
    pub fn decline(&self, intent_id: &str) {
        let mut state = self.state.write().unwrap();
        if let Some(intent) = state.intents.get_mut(intent_id) {
            intent.status = IntentStatus::RequiresPaymentMethod;
        }
    }

    /// Registers a card payment method.
    pub fn add_card(&self, method_id: &str, brand: &str, last4: &str) {
        let value = serde_json::json!({
            "id": method_id,
            "object": "payment_method",
            "type": "card",
            "card": { "brand": brand, "last4": last4 },
        });
        self.state
            .write()
            .unwrap()
            .methods
            .insert(method_id.to_string(), value);
    }

    /// Returns the number of intents created.
    pub fn intent_count(&self) -> usize {
        self.state.read().unwrap().intents.len()
    }

    /// Returns the intent with the given id.
    pub fn intent(&self, intent_id: &str) -> Option<PaymentIntent> {
        self.state.read().unwrap().intents.get(intent_id).cloned()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn create_intent(&self, amount: Money) -> Result<PaymentIntent, PaymentError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_create {
            return Err(PaymentError::Unavailable("Processor unreachable".to_string()));
        }
        if !amount.is_positive() {
            return Err(PaymentError::InvalidAmount(amount));
        }

        state.next_id += 1;
        let id = format!("pi_test_{:04}", state.next_id);
        let status = if state.auto_confirm {
            IntentStatus::Succeeded
        } else {
            IntentStatus::RequiresPaymentMethod
        };
        let intent = PaymentIntent {
            client_secret: format!("{id}_secret_test"),
            id: id.clone(),
            amount,
            status,
            payment_method: None,
        };
        state.intents.insert(id, intent.clone());
        Ok(intent)
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError> {
        validate_object_id(intent_id)?;
        let state = self.state.read().unwrap();
        if state.fail_on_retrieve {
            return Err(PaymentError::Unavailable("Processor unreachable".to_string()));
        }
        state
            .intents
            .get(intent_id)
            .cloned()
            .ok_or_else(|| PaymentError::IntentNotFound(intent_id.to_string()))
    }

    async fn payment_method(&self, method_id: &str) -> Result<serde_json::Value, PaymentError> {
        validate_object_id(method_id)?;
        self.state
            .read()
            .unwrap()
            .methods
            .get(method_id)
            .cloned()
            .ok_or_else(|| PaymentError::MethodNotFound(method_id.to_string()))
    }
}
