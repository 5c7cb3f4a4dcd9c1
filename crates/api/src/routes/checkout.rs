//! Checkout session endpoints: shipping → account → payment → confirmation.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use checkout::{AccountChoice, CheckoutSession, Confirmation, PaymentSubmission, ShippingSubmission};
use common::{BuyerId, CartId, SessionId};
use domain::{SavedAddress, SavedPaymentMethod, ShippingProfile};
use serde::{Deserialize, Serialize};
use store::Store;

use crate::AppState;
use crate::error::ApiError;
use crate::routes::carts::{CartLineResponse, SummaryResponse};
use crate::routes::orders::OrderLineResponse;
use crate::routes::parse_id;

// -- Request types --

#[derive(Deserialize)]
pub struct StartCheckoutRequest {
    pub cart_id: String,
    /// Set when the buyer is already signed in.
    #[serde(default)]
    pub buyer_id: Option<String>,
}

#[derive(Deserialize)]
pub struct SignInRequest {
    pub buyer_id: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub cart_id: String,
    pub buyer_id: Option<String>,
    pub step: String,
    pub lines: Vec<CartLineResponse>,
    pub summary: SummaryResponse,
    pub shipping_address: Option<ShippingProfile>,
    pub sign_in_offer: Option<String>,
    pub saved_addresses: Vec<SavedAddress>,
    pub saved_cards: Vec<SavedCardResponse>,
    pub confirmation: Option<ConfirmationResponse>,
}

#[derive(Serialize)]
pub struct SavedCardResponse {
    pub id: String,
    pub brand: String,
    pub last4: String,
    pub expiry_month: u32,
    pub expiry_year: u32,
}

#[derive(Serialize)]
pub struct ConfirmationResponse {
    pub order_id: String,
    pub order_number: String,
    pub lines: Vec<OrderLineResponse>,
    pub summary: SummaryResponse,
    pub shipping_address: ShippingProfile,
    pub payment_method: String,
}

#[derive(Serialize)]
pub struct PaymentIntentResponse {
    pub intent_id: String,
    pub client_secret: String,
    pub amount_cents: i64,
}

impl From<&SavedPaymentMethod> for SavedCardResponse {
    fn from(method: &SavedPaymentMethod) -> Self {
        Self {
            id: method.id.to_string(),
            brand: method.card_brand.clone(),
            last4: method.last_four.clone(),
            expiry_month: method.expiry_month,
            expiry_year: method.expiry_year,
        }
    }
}

impl From<&Confirmation> for ConfirmationResponse {
    fn from(confirmation: &Confirmation) -> Self {
        Self {
            order_id: confirmation.order_id.to_string(),
            order_number: confirmation.order_number.to_string(),
            lines: confirmation.lines.iter().map(OrderLineResponse::from).collect(),
            summary: SummaryResponse::from(&confirmation.summary),
            shipping_address: confirmation.shipping_address.clone(),
            payment_method: confirmation.payment_method.to_string(),
        }
    }
}

impl From<CheckoutSession> for SessionResponse {
    fn from(session: CheckoutSession) -> Self {
        Self {
            id: session.id.to_string(),
            cart_id: session.cart_id.to_string(),
            buyer_id: session.buyer.account().map(|id| id.to_string()),
            step: session.step.as_str().to_string(),
            lines: session.lines.iter().map(CartLineResponse::from).collect(),
            summary: SummaryResponse::from(&session.summary),
            shipping_address: session.shipping_address,
            sign_in_offer: session.sign_in_offer.map(|offer| offer.email),
            saved_addresses: session.saved_addresses,
            saved_cards: session
                .saved_payment_methods
                .iter()
                .map(SavedCardResponse::from)
                .collect(),
            confirmation: session.confirmation.as_ref().map(ConfirmationResponse::from),
        }
    }
}

fn session_id(raw: &str) -> Result<SessionId, ApiError> {
    Ok(SessionId::from_uuid(parse_id("checkout", raw)?))
}

// -- Handlers --

/// POST /api/checkout: start a checkout from a cart.
#[tracing::instrument(skip(state, req))]
pub async fn start<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<StartCheckoutRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let cart_id = CartId::from_uuid(parse_id("cart", &req.cart_id)?);
    let buyer_id = req
        .buyer_id
        .as_deref()
        .map(|raw| parse_id("buyer", raw).map(BuyerId::from_uuid))
        .transpose()?;

    let session = state.checkout.start(cart_id, buyer_id).await?;
    Ok((StatusCode::CREATED, Json(SessionResponse::from(session))))
}

/// GET /api/checkout/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.checkout.session(session_id(&id)?).await?;
    Ok(Json(session.into()))
}

/// POST /api/checkout/{id}/shipping
#[tracing::instrument(skip(state, submission))]
pub async fn shipping<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(submission): Json<ShippingSubmission>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state
        .checkout
        .submit_shipping(session_id(&id)?, submission)
        .await?;
    Ok(Json(session.into()))
}

/// POST /api/checkout/{id}/sign-in: accept the sign-in offer.
#[tracing::instrument(skip(state, req))]
pub async fn sign_in<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let buyer_id = BuyerId::from_uuid(parse_id("buyer", &req.buyer_id)?);
    let session = state.checkout.sign_in(session_id(&id)?, buyer_id).await?;
    Ok(Json(session.into()))
}

/// POST /api/checkout/{id}/decline-sign-in
#[tracing::instrument(skip(state))]
pub async fn decline_sign_in<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.checkout.decline_sign_in(session_id(&id)?).await?;
    Ok(Json(session.into()))
}

/// POST /api/checkout/{id}/account: create an account or continue as guest.
#[tracing::instrument(skip(state, choice))]
pub async fn account<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(choice): Json<AccountChoice>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state
        .checkout
        .choose_account(session_id(&id)?, choice)
        .await?;
    Ok(Json(session.into()))
}

/// POST /api/checkout/{id}/payment-intent: the intent the client confirms.
#[tracing::instrument(skip(state))]
pub async fn payment_intent<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<PaymentIntentResponse>, ApiError> {
    let intent = state.checkout.begin_payment(session_id(&id)?).await?;
    Ok(Json(PaymentIntentResponse {
        intent_id: intent.id,
        client_secret: intent.client_secret,
        amount_cents: intent.amount.cents(),
    }))
}

/// POST /api/checkout/{id}/payment: place the order after client-side confirmation.
#[tracing::instrument(skip(state, submission))]
pub async fn payment<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(submission): Json<PaymentSubmission>,
) -> Result<Json<ConfirmationResponse>, ApiError> {
    let confirmation = state
        .checkout
        .submit_payment(session_id(&id)?, submission)
        .await?;
    Ok(Json(ConfirmationResponse::from(&confirmation)))
}

/// POST /api/checkout/{id}/back
#[tracing::instrument(skip(state))]
pub async fn back<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.checkout.back(session_id(&id)?).await?;
    Ok(Json(session.into()))
}
