//! Persistence traits.
//!
//! Every trait is object safe and `Send + Sync`; [`Store`] bundles them so
//! services can take a single generic parameter.

use async_trait::async_trait;
use common::{BuyerId, OrderId, ProductRef};
use domain::{
    Order, OrderLine, OrderStatus, PaymentRefs, SavedAddress, SavedPaymentMethod, StockAdjustment,
    StockRecord, UserProfile,
};

use crate::Result;

/// Orders and their lines.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a new order row.
    async fn insert_order(&self, order: &Order) -> Result<()>;

    /// Inserts all lines of one order. Either every line is written or none.
    async fn insert_order_lines(&self, lines: &[OrderLine]) -> Result<()>;

    /// Deletes an order and any of its lines. Returns false if it did not exist.
    async fn delete_order(&self, order_id: OrderId) -> Result<bool>;

    /// Moves an order to `status`, recording payment references when given.
    ///
    /// Re-applying the current status returns the stored order unchanged.
    /// Backward moves fail with [`domain::DomainError::InvalidStatusTransition`].
    async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        payment: Option<&PaymentRefs>,
    ) -> Result<Order>;

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Lines of an order in insertion order.
    async fn get_order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>>;
}

/// Named counters.
#[async_trait]
pub trait SequenceStore: Send + Sync {
    /// Atomically increments the named sequence and returns the new value.
    /// The first call for a name returns 1.
    async fn next_value(&self, name: &str) -> Result<i64>;
}

/// Product stock.
#[async_trait]
pub trait StockStore: Send + Sync {
    async fn get_stock(&self, product_ref: &ProductRef) -> Result<Option<StockRecord>>;

    /// Atomically removes `quantity` units, clamping at zero and flagging the
    /// product sold out when it reaches zero. Category records yield `None`.
    async fn decrement_clamped(
        &self,
        product_ref: &ProductRef,
        quantity: u32,
    ) -> Result<Option<StockAdjustment>>;

    async fn upsert_stock(&self, record: &StockRecord) -> Result<()>;
}

/// Saved shipping addresses.
#[async_trait]
pub trait AddressStore: Send + Sync {
    /// Addresses of a buyer, newest first.
    async fn list_addresses(&self, buyer_id: BuyerId) -> Result<Vec<SavedAddress>>;

    async fn save_address(&self, address: &SavedAddress) -> Result<()>;
}

/// Buyer accounts.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Looks up an account by email, case-insensitively.
    async fn find_account_by_email(&self, email: &str) -> Result<Option<UserProfile>>;

    async fn get_account(&self, buyer_id: BuyerId) -> Result<Option<UserProfile>>;

    /// Creates an account. Fails with [`crate::StoreError::DuplicateAccount`]
    /// if the email is taken.
    async fn create_account(&self, profile: &UserProfile) -> Result<()>;
}

/// Saved cards.
#[async_trait]
pub trait PaymentMethodStore: Send + Sync {
    /// Saved cards of a buyer, newest first.
    async fn list_payment_methods(&self, buyer_id: BuyerId) -> Result<Vec<SavedPaymentMethod>>;

    async fn save_payment_method(&self, method: &SavedPaymentMethod) -> Result<()>;
}

/// Every store the checkout needs.
pub trait Store:
    OrderStore + SequenceStore + StockStore + AddressStore + AccountStore + PaymentMethodStore
{
}

impl<T> Store for T where
    T: OrderStore + SequenceStore + StockStore + AddressStore + AccountStore + PaymentMethodStore
{
}
