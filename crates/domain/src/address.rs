//! Shipping and billing addresses.

use chrono::{DateTime, Utc};
use common::BuyerId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Country recorded on saved addresses. The store only ships domestically.
pub const DEFAULT_COUNTRY: &str = "US";

/// Address and contact details submitted at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShippingProfile {
    pub first_name: String,
    pub last_name: String,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ShippingProfile {
    /// Checks required fields. Shipping requires an email, billing does not.
    pub fn validate(&self, require_email: bool) -> Result<(), DomainError> {
        let required = [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("address_line1", &self.address_line1),
            ("city", &self.city),
            ("state", &self.state),
            ("postal_code", &self.postal_code),
            ("phone", &self.phone),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DomainError::MissingField(field));
            }
        }
        if require_email {
            match self.email.as_deref().map(str::trim) {
                Some(email) if email.contains('@') => {}
                _ => return Err(DomainError::MissingField("email")),
            }
        }
        Ok(())
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Normalized email, if present.
    pub fn email(&self) -> Option<String> {
        self.email
            .as_deref()
            .map(|e| e.trim().to_ascii_lowercase())
            .filter(|e| !e.is_empty())
    }

    /// Copy of this profile with the email replaced.
    pub fn with_email(&self, email: Option<String>) -> Self {
        Self {
            email,
            ..self.clone()
        }
    }
}

/// An address an authenticated buyer saved for reuse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedAddress {
    pub id: Uuid,
    pub buyer_id: BuyerId,
    pub is_default: bool,
    pub country: String,
    pub profile: ShippingProfile,
    pub created_at: DateTime<Utc>,
}

impl SavedAddress {
    pub fn new(buyer_id: BuyerId, profile: ShippingProfile) -> Self {
        Self {
            id: Uuid::new_v4(),
            buyer_id,
            is_default: false,
            country: DEFAULT_COUNTRY.to_string(),
            profile,
            created_at: Utc::now(),
        }
    }
}
