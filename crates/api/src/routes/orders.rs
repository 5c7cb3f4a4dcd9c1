//! Order lookup endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::OrderId;
use domain::{Order, OrderLine, ShippingProfile};
use serde::Serialize;
use store::Store;

use crate::AppState;
use crate::error::ApiError;
use crate::routes::parse_id;

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub order_number: String,
    pub buyer_id: Option<String>,
    pub status: String,
    pub total_cents: i64,
    pub guest_email: Option<String>,
    pub shipping_address: ShippingProfile,
    pub payment_intent_id: Option<String>,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub lines: Vec<OrderLineResponse>,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct OrderLineResponse {
    pub product_ref: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

impl From<&OrderLine> for OrderLineResponse {
    fn from(line: &OrderLine) -> Self {
        Self {
            product_ref: line.product_ref.to_string(),
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price_cents: line.unit_price.cents(),
            line_total_cents: line.line_total().cents(),
        }
    }
}

impl OrderResponse {
    fn new(order: Order, lines: &[OrderLine]) -> Self {
        Self {
            id: order.id.to_string(),
            order_number: order.order_number.to_string(),
            buyer_id: order.buyer.account().map(|id| id.to_string()),
            status: order.status.as_str().to_string(),
            total_cents: order.total_amount.cents(),
            guest_email: order.guest_email,
            shipping_address: order.shipping_address,
            payment_intent_id: order.payment.map(|refs| refs.payment_intent_id),
            tracking_number: order.tracking_number,
            carrier: order.carrier,
            lines: lines.iter().map(OrderLineResponse::from).collect(),
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

/// GET /api/orders/{id}: an order with its lines.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = OrderId::from_uuid(parse_id("order", &id)?);
    let details = state.checkout.order(order_id).await?;
    Ok(Json(OrderResponse::new(details.order, &details.lines)))
}
