//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{CartId, ProductRef};
use domain::{Cart, CartLine, Money, OrderSummary};
use serde::{Deserialize, Serialize};
use store::Store;

use crate::AppState;
use crate::error::ApiError;
use crate::routes::parse_id;

// -- Request types --

#[derive(Deserialize)]
pub struct PutItemRequest {
    pub product_ref: String,
    pub quantity: u32,
    /// Required when the product is not in the cart yet.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub unit_price_cents: Option<i64>,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartResponse {
    pub id: String,
    pub lines: Vec<CartLineResponse>,
    pub summary: SummaryResponse,
}

#[derive(Serialize)]
pub struct CartLineResponse {
    pub product_ref: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: u32,
    pub line_total_cents: i64,
}

#[derive(Serialize)]
pub struct SummaryResponse {
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub shipping_cents: i64,
    pub total_cents: i64,
    pub free_shipping: bool,
}

impl From<&CartLine> for CartLineResponse {
    fn from(line: &CartLine) -> Self {
        Self {
            product_ref: line.product_ref.to_string(),
            name: line.name.clone(),
            unit_price_cents: line.unit_price.cents(),
            quantity: line.quantity,
            line_total_cents: line.line_total().cents(),
        }
    }
}

impl From<&OrderSummary> for SummaryResponse {
    fn from(summary: &OrderSummary) -> Self {
        Self {
            subtotal_cents: summary.subtotal.cents(),
            tax_cents: summary.tax.cents(),
            shipping_cents: summary.shipping.cents(),
            total_cents: summary.total.cents(),
            free_shipping: summary.ships_free(),
        }
    }
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        Self {
            id: cart.id().to_string(),
            lines: cart.lines().iter().map(CartLineResponse::from).collect(),
            summary: SummaryResponse::from(&OrderSummary::for_lines(cart.lines())),
        }
    }
}

// -- Handlers --

/// POST /api/carts: create an empty cart.
#[tracing::instrument(skip(state))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> (StatusCode, Json<CartResponse>) {
    let cart = state.checkout.create_cart().await;
    (StatusCode::CREATED, Json(CartResponse::from(&cart)))
}

/// GET /api/carts/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart_id = CartId::from_uuid(parse_id("cart", &id)?);
    let cart = state.checkout.get_cart(cart_id).await?;
    Ok(Json(CartResponse::from(&cart)))
}

/// PUT /api/carts/{id}/items: set a product's quantity, adding the line if needed.
///
/// A quantity of zero removes the line.
#[tracing::instrument(skip(state, req))]
pub async fn put_item<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<PutItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart_id = CartId::from_uuid(parse_id("cart", &id)?);
    let product_ref = ProductRef::from(req.product_ref);

    let existing = state.checkout.get_cart(cart_id).await?;
    let in_cart = existing
        .lines()
        .iter()
        .any(|line| line.product_ref == product_ref);

    let cart = if in_cart {
        state
            .checkout
            .set_cart_quantity(cart_id, &product_ref, req.quantity)
            .await?
    } else {
        let (Some(name), Some(price)) = (req.name, req.unit_price_cents) else {
            return Err(ApiError::BadRequest(
                "name and unit_price_cents are required for a new cart item".to_string(),
            ));
        };
        state
            .checkout
            .add_to_cart(
                cart_id,
                CartLine::new(product_ref, name, Money::from_cents(price), req.quantity),
            )
            .await?
    };

    Ok(Json(CartResponse::from(&cart)))
}

/// DELETE /api/carts/{id}/items/{product}
#[tracing::instrument(skip(state))]
pub async fn remove_item<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((id, product)): Path<(String, String)>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart_id = CartId::from_uuid(parse_id("cart", &id)?);
    let cart = state
        .checkout
        .remove_from_cart(cart_id, &ProductRef::from(product))
        .await?;
    Ok(Json(CartResponse::from(&cart)))
}
