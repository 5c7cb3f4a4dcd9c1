use common::OrderId;
use domain::DomainError;
use thiserror::Error;

/// Errors that can occur when reading or writing storefront records.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The product has no stock record.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// An account with this email already exists.
    #[error("Account already exists for {0}")]
    DuplicateAccount(String),

    /// The write would break a domain rule (for example a backward status move).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A stored row could not be mapped back to a domain type.
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    /// The backend refused the operation (used by the in-memory store's
    /// failure switches and for exhausted pools).
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns true if retrying the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Database(_))
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
