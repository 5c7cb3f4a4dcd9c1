//! Payment processor endpoints used directly by the storefront client.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use domain::Money;
use serde::{Deserialize, Serialize};
use store::Store;

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreatePaymentIntentRequest {
    /// Dollars.
    #[serde(default)]
    pub amount: Option<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentResponse {
    pub client_secret: String,
}

/// POST /api/stripe/create-payment-intent: creates a USD intent for `amount` dollars.
#[tracing::instrument(skip(state, body))]
pub async fn create_payment_intent<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<CreatePaymentIntentRequest>, JsonRejection>,
) -> Result<Json<CreatePaymentIntentResponse>, ApiError> {
    let amount = body
        .ok()
        .and_then(|Json(req)| req.amount)
        .filter(|amount| amount.is_finite() && *amount > 0.0)
        .ok_or_else(|| ApiError::BadRequest("Amount is required".to_string()))?;

    let intent = state
        .payments()
        .create_intent(Money::from_major(amount))
        .await?;
    metrics::counter!("payment_intents_created_total").increment(1);
    tracing::info!(intent_id = %intent.id, "payment intent created");

    Ok(Json(CreatePaymentIntentResponse {
        client_secret: intent.client_secret,
    }))
}

/// GET /api/stripe/payment-methods/{id}: the processor's payment method resource.
#[tracing::instrument(skip(state))]
pub async fn payment_method<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if id.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Payment method ID is required".to_string(),
        ));
    }
    let method = state.payments().payment_method(&id).await?;
    Ok(Json(method))
}
