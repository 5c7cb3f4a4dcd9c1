//! Payment instrument details shown to the buyer.

use chrono::{DateTime, Utc};
use common::BuyerId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Brand and last four digits of the card used for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodSummary {
    pub brand: String,
    pub last4: String,
}

impl PaymentMethodSummary {
    pub fn new(brand: impl Into<String>, last4: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            last4: last4.into(),
        }
    }

    /// Shown when the processor lookup fails or no method id was given.
    pub fn fallback() -> Self {
        Self::new("Card", "****")
    }

    /// Reads `card.brand` and `card.last4` from a processor payment-method
    /// resource. Returns `None` when the resource has no card object.
    pub fn from_processor_json(value: &serde_json::Value) -> Option<Self> {
        let card = value.get("card")?.as_object()?;
        let brand = card
            .get("brand")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("card");
        let last4 = card
            .get("last4")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("****");
        Some(Self::new(brand, last4))
    }
}

impl Default for PaymentMethodSummary {
    fn default() -> Self {
        Self::fallback()
    }
}

impl std::fmt::Display for PaymentMethodSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ending in {}", self.brand, self.last4)
    }
}

/// A card an authenticated buyer saved with the processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPaymentMethod {
    pub id: Uuid,
    pub buyer_id: BuyerId,
    pub card_brand: String,
    pub last_four: String,
    pub expiry_month: u32,
    pub expiry_year: u32,
    pub created_at: DateTime<Utc>,
}

impl SavedPaymentMethod {
    pub fn summary(&self) -> PaymentMethodSummary {
        PaymentMethodSummary::new(self.card_brand.clone(), self.last_four.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reads_card_details() {
        let value = json!({"id": "pm_1", "card": {"brand": "visa", "last4": "4242"}});
        let summary = PaymentMethodSummary::from_processor_json(&value).unwrap();
        assert_eq!(summary, PaymentMethodSummary::new("visa", "4242"));
        assert_eq!(summary.to_string(), "visa ending in 4242");
    }

    #[test]
    fn test_missing_card_fields_use_placeholders() {
        let value = json!({"card": {}});
        let summary = PaymentMethodSummary::from_processor_json(&value).unwrap();
        assert_eq!(summary, PaymentMethodSummary::new("card", "****"));
    }

    #[test]
    fn test_no_card_object() {
        let value = json!({"type": "us_bank_account"});
        assert!(PaymentMethodSummary::from_processor_json(&value).is_none());
        assert_eq!(PaymentMethodSummary::default().brand, "Card");
    }
}
