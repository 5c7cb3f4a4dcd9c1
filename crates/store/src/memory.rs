use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{BuyerId, OrderId, ProductRef};
use domain::{
    Order, OrderLine, OrderStatus, PaymentRefs, SavedAddress, SavedPaymentMethod, StockAdjustment,
    StockRecord, UserProfile,
};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    store::{AccountStore, AddressStore, OrderStore, PaymentMethodStore, SequenceStore, StockStore},
};

#[derive(Debug, Default)]
struct Failures {
    next_value: bool,
    insert_order: bool,
    insert_order_lines: bool,
    update_status: bool,
    decrement: bool,
    account_lookup: bool,
}

#[derive(Debug, Default)]
struct State {
    orders: HashMap<OrderId, Order>,
    lines: Vec<OrderLine>,
    sequences: HashMap<String, i64>,
    stock: HashMap<ProductRef, StockRecord>,
    addresses: Vec<SavedAddress>,
    accounts: HashMap<BuyerId, UserProfile>,
    payment_methods: Vec<SavedPaymentMethod>,
    fail: Failures,
}

fn unavailable(operation: &str) -> StoreError {
    StoreError::Unavailable(format!("{operation} failed"))
}

/// In-memory store used when no database is configured and in tests.
///
/// Every operation runs inside a single write-lock critical section, which
/// gives the same atomicity the PostgreSQL statements give. Failure switches
/// (`set_fail_on_*`) let tests inject backend errors at each step.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `next_value` fail.
    pub async fn set_fail_on_next_value(&self, fail: bool) {
        self.state.write().await.fail.next_value = fail;
    }

    /// Makes `insert_order` fail.
    pub async fn set_fail_on_insert_order(&self, fail: bool) {
        self.state.write().await.fail.insert_order = fail;
    }

    /// Makes `insert_order_lines` fail.
    pub async fn set_fail_on_insert_order_lines(&self, fail: bool) {
        self.state.write().await.fail.insert_order_lines = fail;
    }

    /// Makes `update_status` fail.
    pub async fn set_fail_on_update_status(&self, fail: bool) {
        self.state.write().await.fail.update_status = fail;
    }

    /// Makes `decrement_clamped` fail.
    pub async fn set_fail_on_decrement(&self, fail: bool) {
        self.state.write().await.fail.decrement = fail;
    }

    /// Makes `find_account_by_email` fail.
    pub async fn set_fail_on_account_lookup(&self, fail: bool) {
        self.state.write().await.fail.account_lookup = fail;
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns the number of stored order lines across all orders.
    pub async fn order_line_count(&self) -> usize {
        self.state.read().await.lines.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(&self, order: &Order) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail.insert_order {
            return Err(unavailable("insert_order"));
        }
        state.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn insert_order_lines(&self, lines: &[OrderLine]) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail.insert_order_lines {
            return Err(unavailable("insert_order_lines"));
        }
        if let Some(missing) = lines.iter().find(|l| !state.orders.contains_key(&l.order_id)) {
            return Err(StoreError::OrderNotFound(missing.order_id));
        }
        state.lines.extend(lines.iter().cloned());
        Ok(())
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<bool> {
        let mut state = self.state.write().await;
        state.lines.retain(|l| l.order_id != order_id);
        Ok(state.orders.remove(&order_id).is_some())
    }

    async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        payment: Option<&PaymentRefs>,
    ) -> Result<Order> {
        let mut state = self.state.write().await;
        if state.fail.update_status {
            return Err(unavailable("update_status"));
        }
        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;

        if order.status == status {
            return Ok(order.clone());
        }
        order.status = order.status.transition_to(status)?;
        if let Some(payment) = payment {
            order.payment = Some(payment.clone());
        }
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&order_id).cloned())
    }

    async fn get_order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>> {
        let state = self.state.read().await;
        Ok(state
            .lines
            .iter()
            .filter(|l| l.order_id == order_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SequenceStore for InMemoryStore {
    async fn next_value(&self, name: &str) -> Result<i64> {
        let mut state = self.state.write().await;
        if state.fail.next_value {
            return Err(unavailable("next_value"));
        }
        let value = state.sequences.entry(name.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }
}

#[async_trait]
impl StockStore for InMemoryStore {
    async fn get_stock(&self, product_ref: &ProductRef) -> Result<Option<StockRecord>> {
        Ok(self.state.read().await.stock.get(product_ref).cloned())
    }

    async fn decrement_clamped(
        &self,
        product_ref: &ProductRef,
        quantity: u32,
    ) -> Result<Option<StockAdjustment>> {
        let mut state = self.state.write().await;
        if state.fail.decrement {
            return Err(unavailable("decrement_clamped"));
        }
        let record = state
            .stock
            .get_mut(product_ref)
            .ok_or_else(|| StoreError::ProductNotFound(product_ref.to_string()))?;
        Ok(record.apply_purchase(quantity))
    }

    async fn upsert_stock(&self, record: &StockRecord) -> Result<()> {
        self.state
            .write()
            .await
            .stock
            .insert(record.product_ref.clone(), record.clone());
        Ok(())
    }
}

#[async_trait]
impl AddressStore for InMemoryStore {
    async fn list_addresses(&self, buyer_id: BuyerId) -> Result<Vec<SavedAddress>> {
        let state = self.state.read().await;
        let mut addresses: Vec<_> = state
            .addresses
            .iter()
            .filter(|a| a.buyer_id == buyer_id)
            .cloned()
            .collect();
        addresses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(addresses)
    }

    async fn save_address(&self, address: &SavedAddress) -> Result<()> {
        self.state.write().await.addresses.push(address.clone());
        Ok(())
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<UserProfile>> {
        let state = self.state.read().await;
        if state.fail.account_lookup {
            return Err(unavailable("find_account_by_email"));
        }
        let email = email.trim();
        Ok(state
            .accounts
            .values()
            .find(|p| p.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn get_account(&self, buyer_id: BuyerId) -> Result<Option<UserProfile>> {
        Ok(self.state.read().await.accounts.get(&buyer_id).cloned())
    }

    async fn create_account(&self, profile: &UserProfile) -> Result<()> {
        let mut state = self.state.write().await;
        if state
            .accounts
            .values()
            .any(|p| p.email.eq_ignore_ascii_case(&profile.email))
        {
            return Err(StoreError::DuplicateAccount(profile.email.clone()));
        }
        state.accounts.insert(profile.id, profile.clone());
        Ok(())
    }
}

#[async_trait]
impl PaymentMethodStore for InMemoryStore {
    async fn list_payment_methods(&self, buyer_id: BuyerId) -> Result<Vec<SavedPaymentMethod>> {
        let state = self.state.read().await;
        let mut methods: Vec<_> = state
            .payment_methods
            .iter()
            .filter(|m| m.buyer_id == buyer_id)
            .cloned()
            .collect();
        methods.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(methods)
    }

    async fn save_payment_method(&self, method: &SavedPaymentMethod) -> Result<()> {
        self.state.write().await.payment_methods.push(method.clone());
        Ok(())
    }
}
