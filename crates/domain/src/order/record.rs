//! Persisted order and order line records.

use chrono::{DateTime, Utc};
use common::{BuyerRef, OrderId, ProductRef};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::ShippingProfile;
use crate::cart::CartLine;
use crate::money::Money;
use crate::order::{OrderNumber, OrderStatus};

/// References to the payment processor recorded when the order is paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRefs {
    pub payment_intent_id: String,
    pub payment_status: String,
}

impl PaymentRefs {
    pub fn new(payment_intent_id: impl Into<String>, payment_status: impl Into<String>) -> Self {
        Self {
            payment_intent_id: payment_intent_id.into(),
            payment_status: payment_status.into(),
        }
    }
}

/// Input for creating an order row.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub buyer: BuyerRef,
    pub order_number: OrderNumber,
    pub shipping_address: ShippingProfile,
    pub billing_address: ShippingProfile,
    pub total_amount: Money,
    /// Contact email for guest orders.
    pub guest_email: Option<String>,
}

impl NewOrder {
    /// Builds a pending order, stamping ids and timestamps.
    pub fn into_order(self) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::new(),
            order_number: self.order_number,
            buyer: self.buyer,
            status: OrderStatus::Pending,
            shipping_address: self.shipping_address,
            billing_address: self.billing_address,
            total_amount: self.total_amount,
            guest_email: self.guest_email,
            tracking_number: None,
            carrier: None,
            tracking_url: None,
            payment: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub buyer: BuyerRef,
    pub status: OrderStatus,
    pub shipping_address: ShippingProfile,
    pub billing_address: ShippingProfile,
    pub total_amount: Money,
    pub guest_email: Option<String>,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub tracking_url: Option<String>,
    pub payment: Option<PaymentRefs>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_guest(&self) -> bool {
        self.buyer.is_guest()
    }
}

/// Input for one order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    pub product_ref: ProductRef,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl From<&CartLine> for NewOrderLine {
    fn from(line: &CartLine) -> Self {
        Self {
            product_ref: line.product_ref.clone(),
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
        }
    }
}

impl NewOrderLine {
    pub fn into_line(self, order_id: OrderId) -> OrderLine {
        OrderLine {
            id: Uuid::new_v4(),
            order_id,
            product_ref: self.product_ref,
            name: self.name,
            quantity: self.quantity,
            unit_price: self.unit_price,
            created_at: Utc::now(),
        }
    }
}

/// An immutable snapshot of a purchased product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: Uuid,
    pub order_id: OrderId,
    pub product_ref: ProductRef,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub created_at: DateTime<Utc>,
}

impl OrderLine {
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}
