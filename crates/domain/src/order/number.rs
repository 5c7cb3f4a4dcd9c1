//! Human-readable order numbers.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Name of the store sequence that backs order numbers.
pub const ORDER_NUMBER_SEQUENCE: &str = "order_number";

/// An order number of the form `ORD-{YY}{MM}{DD}-{sequence}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Formats an order number from a generation date and a sequence value.
    pub fn format(date: NaiveDate, sequence: i64) -> Self {
        Self(format!(
            "ORD-{:02}{:02}{:02}-{}",
            date.year().rem_euclid(100),
            date.month(),
            date.day(),
            sequence
        ))
    }

    /// Wraps a number already persisted.
    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the sequence part, if the number is well formed.
    pub fn sequence(&self) -> Option<i64> {
        self.0.rsplit('-').next()?.parse().ok()
    }
}

impl std::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
