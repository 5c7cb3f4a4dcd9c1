//! Buyer account profile.

use chrono::{DateTime, Utc};
use common::BuyerId;
use serde::{Deserialize, Serialize};

use crate::address::ShippingProfile;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: BuyerId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Profile for an account created during checkout.
    pub fn from_shipping(id: BuyerId, email: &str, profile: &ShippingProfile) -> Self {
        Self {
            id,
            email: email.trim().to_ascii_lowercase(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            created_at: Utc::now(),
        }
    }
}
