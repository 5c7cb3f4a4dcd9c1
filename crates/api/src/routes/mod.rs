//! HTTP route handlers.

pub mod carts;
pub mod checkout;
pub mod email;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod stripe;

use uuid::Uuid;

use crate::error::ApiError;

/// Parses a UUID path segment.
pub(crate) fn parse_id(kind: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|e| ApiError::BadRequest(format!("Invalid {kind} id: {e}")))
}
