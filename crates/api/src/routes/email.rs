//! Order email endpoint used directly by the storefront client.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use checkout::{EmailItem, OrderEmail};
use domain::{
    MAX_LINE_QUANTITY, MAX_UNIT_PRICE_CENTS, Money, OrderSummary, PaymentMethodSummary,
    ShippingProfile,
};
use serde::{Deserialize, Serialize};
use store::Store;

use crate::AppState;
use crate::error::ApiError;

const INVALID_ORDER_DETAILS: &str = "Invalid order details";

/// Order details as sent by the client. Amounts are dollars.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOrderEmailsRequest {
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<EmailItemRequest>>,
    #[serde(default)]
    pub shipping_address: Option<EmailAddressRequest>,
    #[serde(default)]
    pub order_summary: Option<OrderSummaryRequest>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethodRequest>,
}

#[derive(Debug, Deserialize)]
pub struct EmailItemRequest {
    pub name: String,
    pub quantity: u32,
    pub price: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAddressRequest {
    pub first_name: String,
    pub last_name: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OrderSummaryRequest {
    pub subtotal: f64,
    pub tax: f64,
    pub shipping: f64,
    pub total: f64,
}

#[derive(Debug, Deserialize)]
pub struct PaymentMethodRequest {
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub last4: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOrderEmailsResponse {
    pub success: bool,
    pub customer_email_sent: bool,
    pub admin_email_sent: bool,
}

impl EmailItemRequest {
    /// Items carry the same bounds as cart lines.
    fn into_item(self) -> Option<EmailItem> {
        if !self.price.is_finite() || !(1..=MAX_LINE_QUANTITY).contains(&self.quantity) {
            return None;
        }
        let unit_price = Money::from_major(self.price);
        if !(0..=MAX_UNIT_PRICE_CENTS).contains(&unit_price.cents()) {
            return None;
        }
        Some(EmailItem {
            name: self.name,
            quantity: self.quantity,
            unit_price,
        })
    }
}

impl SendOrderEmailsRequest {
    fn into_email(self) -> Option<OrderEmail> {
        let order_number = self.order_number.filter(|n| !n.trim().is_empty())?;
        let items: Vec<EmailItem> = self
            .items?
            .into_iter()
            .map(EmailItemRequest::into_item)
            .collect::<Option<_>>()?;
        let address = self.shipping_address?;

        // Without a client summary, price the items the same way checkout does.
        let summary = match self.order_summary {
            Some(s) => OrderSummary {
                subtotal: Money::from_major(s.subtotal),
                tax: Money::from_major(s.tax),
                shipping: Money::from_major(s.shipping),
                total: Money::from_major(s.total),
            },
            None => OrderSummary::from_items(items.iter().map(|i| (i.unit_price, i.quantity))),
        };

        let fallback = PaymentMethodSummary::fallback();
        let payment_method = match self.payment_method {
            Some(pm) => PaymentMethodSummary::new(
                pm.brand.unwrap_or(fallback.brand),
                pm.last4.unwrap_or(fallback.last4),
            ),
            None => fallback,
        };

        Some(OrderEmail {
            order_number,
            items,
            shipping_address: ShippingProfile {
                first_name: address.first_name,
                last_name: address.last_name,
                address_line1: address.address_line1,
                address_line2: address.address_line2,
                city: address.city,
                state: address.state,
                postal_code: address.postal_code,
                phone: address.phone,
                email: address.email,
            },
            summary,
            payment_method,
        })
    }
}

/// POST /api/email/send-order-emails: customer confirmation and operator notice.
///
/// Delivery failures are reported in the body, never as an error status.
#[tracing::instrument(skip(state, body))]
pub async fn send_order_emails<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<SendOrderEmailsRequest>, JsonRejection>,
) -> Result<Json<SendOrderEmailsResponse>, ApiError> {
    let email = body
        .ok()
        .and_then(|Json(req)| req.into_email())
        .ok_or_else(|| ApiError::BadRequest(INVALID_ORDER_DETAILS.to_string()))?;

    let outcome = state.notifications.dispatch(&email).await;

    Ok(Json(SendOrderEmailsResponse {
        success: true,
        customer_email_sent: outcome.customer_sent,
        admin_email_sent: outcome.operator_sent,
    }))
}
