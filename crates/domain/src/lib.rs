//! Domain layer for the storefront checkout.
//!
//! This crate holds the pure parts of the checkout:
//! - `Money` and the pricing calculator
//! - carts and the shipping profile a buyer submits
//! - orders, order lines and the order status rules
//! - product stock records and the clamped decrement rule
//!
//! Nothing here performs I/O.

pub mod account;
pub mod address;
pub mod cart;
pub mod error;
pub mod money;
pub mod order;
pub mod payment;
pub mod pricing;
pub mod stock;

pub use account::UserProfile;
pub use address::{SavedAddress, ShippingProfile};
pub use cart::{Cart, CartLine, MAX_LINE_QUANTITY, MAX_UNIT_PRICE_CENTS};
pub use error::DomainError;
pub use money::Money;
pub use order::{
    NewOrder, NewOrderLine, Order, OrderLine, OrderNumber, OrderStatus, PaymentRefs,
    ORDER_NUMBER_SEQUENCE,
};
pub use payment::{PaymentMethodSummary, SavedPaymentMethod};
pub use pricing::{FREE_SHIPPING_THRESHOLD, FLAT_SHIPPING_FEE, OrderSummary, TAX_RATE_PERCENT};
pub use stock::{StockAdjustment, StockRecord};
