//! Identifiers shared by every crate in the storefront workspace.

pub mod types;

pub use types::{BuyerId, BuyerRef, CartId, GUEST_BUYER_ID, OrderId, ProductRef, SessionId};
