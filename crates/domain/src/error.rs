//! Domain error types.

use thiserror::Error;

use crate::order::OrderStatus;

/// Errors raised by domain rules. None of them has side effects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A required field was missing or blank.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Quantities must be positive.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// More units of one product than a single line may hold.
    #[error("Quantity too large: {quantity} (at most {max} per item)")]
    QuantityTooLarge { quantity: u64, max: u32 },

    /// Unit price above what the store will charge for one item.
    #[error("Price too large: {price} cents (at most {max})")]
    PriceTooLarge { price: i64, max: i64 },

    /// Prices must not be negative.
    #[error("Invalid price: {price} (must not be negative)")]
    InvalidPrice { price: i64 },

    /// Checkout cannot start from an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Line not present in the cart.
    #[error("Item not found: {product_ref}")]
    ItemNotFound { product_ref: String },

    /// Orders never move backward.
    #[error("Invalid status transition: cannot move order from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// Status text that does not name a known status.
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),
}
