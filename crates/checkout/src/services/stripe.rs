//! Stripe REST client.

use async_trait::async_trait;
use domain::Money;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::services::payment::{PaymentError, PaymentGateway, PaymentIntent, validate_object_id};

/// Stripe API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

const CURRENCY: &str = "usd";

/// Stripe credentials.
///
/// Implements `Debug` manually to redact the secret key.
#[derive(Clone)]
pub struct StripeSettings {
    pub secret_key: SecretString,
    /// Overridable so tests can point the client at a mock server.
    pub api_base: String,
}

impl std::fmt::Debug for StripeSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeSettings")
            .field("secret_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

/// Payment gateway backed by the Stripe API.
#[derive(Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: SecretString,
    api_base: String,
}

impl StripeGateway {
    /// Create a new Stripe client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(settings: &StripeSettings) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            secret_key: settings.secret_key.clone(),
            api_base: settings.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.api_base)
    }

    async fn error_from(response: reqwest::Response) -> PaymentError {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error.message)
            .unwrap_or(text);
        PaymentError::Api { status, message }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[tracing::instrument(skip(self), fields(amount_cents = amount.cents()))]
    async fn create_intent(&self, amount: Money) -> Result<PaymentIntent, PaymentError> {
        if !amount.is_positive() {
            return Err(PaymentError::InvalidAmount(amount));
        }

        let amount_param = amount.cents().to_string();
        let params = [
            ("amount", amount_param.as_str()),
            ("currency", CURRENCY),
            ("automatic_payment_methods[enabled]", "true"),
        ];

        let response = self
            .client
            .post(self.url("payment_intents"))
            .bearer_auth(self.secret_key.expose_secret())
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let intent: PaymentIntent = response
            .json()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))?;
        tracing::info!(intent_id = %intent.id, "payment intent created");
        Ok(intent)
    }

    #[tracing::instrument(skip(self))]
    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError> {
        validate_object_id(intent_id)?;
        let response = self
            .client
            .get(self.url(&format!("payment_intents/{intent_id}")))
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(PaymentError::IntentNotFound(intent_id.to_string())),
            status if !status.is_success() => Err(Self::error_from(response).await),
            _ => response
                .json()
                .await
                .map_err(|e| PaymentError::Parse(e.to_string())),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn payment_method(&self, method_id: &str) -> Result<serde_json::Value, PaymentError> {
        validate_object_id(method_id)?;
        let response = self
            .client
            .get(self.url(&format!("payment_methods/{method_id}")))
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(PaymentError::MethodNotFound(method_id.to_string())),
            status if !status.is_success() => Err(Self::error_from(response).await),
            _ => response
                .json()
                .await
                .map_err(|e| PaymentError::Parse(e.to_string())),
        }
    }
}
