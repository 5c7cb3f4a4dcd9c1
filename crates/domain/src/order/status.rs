//! Order status lifecycle.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The status of a persisted order.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Paid
///           └──► Failed
/// ```
/// Paid and Failed are terminal; an order never moves backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Created, lines may or may not be written yet, payment unverified.
    #[default]
    Pending,

    /// Payment verified (terminal state).
    Paid,

    /// Abandoned or declined, set by reconciliation (terminal state).
    Failed,
}

impl OrderStatus {
    /// Returns true if the order can be marked paid from this status.
    pub fn can_mark_paid(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if the order can be marked failed from this status.
    pub fn can_mark_failed(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Failed)
    }

    /// Checks that moving to `next` is allowed.
    ///
    /// Re-applying the current status is accepted so that marking an order
    /// paid twice is a no-op rather than an error.
    pub fn transition_to(&self, next: OrderStatus) -> Result<OrderStatus, DomainError> {
        if *self == next {
            return Ok(next);
        }
        let allowed = match next {
            OrderStatus::Paid => self.can_mark_paid(),
            OrderStatus::Failed => self.can_mark_failed(),
            OrderStatus::Pending => false,
        };
        if allowed {
            Ok(next)
        } else {
            Err(DomainError::InvalidStatusTransition {
                from: *self,
                to: next,
            })
        }
    }

    /// Returns the status as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "failed" => Ok(OrderStatus::Failed),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}
