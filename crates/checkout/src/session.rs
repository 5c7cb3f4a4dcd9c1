//! Checkout sessions, carts, and the registries that hold them.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use common::{BuyerRef, CartId, OrderId, SessionId};
use domain::{
    Cart, CartLine, Order, OrderLine, OrderNumber, OrderSummary, PaymentMethodSummary,
    SavedAddress, SavedPaymentMethod, ShippingProfile,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use crate::services::payment::PaymentIntent;
use crate::state::CheckoutStep;

/// Offer made when the shipping email belongs to an existing account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInOffer {
    pub email: String,
}

/// Read-only receipt shown on the confirmation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub order_id: OrderId,
    pub order_number: OrderNumber,
    pub lines: Vec<OrderLine>,
    pub summary: OrderSummary,
    pub shipping_address: ShippingProfile,
    pub payment_method: PaymentMethodSummary,
}

/// An order written for this session that is not paid yet.
///
/// A resubmission with the same intent and addresses pays this order instead
/// of writing another one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOrder {
    pub intent_id: String,
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

impl PendingOrder {
    /// True while the order still describes the checkout being paid.
    pub fn matches(
        &self,
        intent_id: &str,
        buyer: BuyerRef,
        shipping: &ShippingProfile,
        billing: &ShippingProfile,
    ) -> bool {
        self.intent_id == intent_id
            && self.order.buyer == buyer
            && &self.order.shipping_address == shipping
            && &self.order.billing_address == billing
    }
}

/// State of one buyer's checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: SessionId,
    pub cart_id: CartId,
    pub buyer: BuyerRef,
    pub step: CheckoutStep,
    /// Cart contents when checkout started.
    pub lines: Vec<CartLine>,
    pub summary: OrderSummary,
    pub shipping_address: Option<ShippingProfile>,
    pub sign_in_offer: Option<SignInOffer>,
    #[serde(skip)]
    pub payment_intent: Option<PaymentIntent>,
    #[serde(skip)]
    pub pending_order: Option<PendingOrder>,
    pub saved_addresses: Vec<SavedAddress>,
    pub saved_payment_methods: Vec<SavedPaymentMethod>,
    pub confirmation: Option<Confirmation>,
}

impl CheckoutSession {
    /// Starts a session on the shipping step from a cart snapshot.
    pub fn new(cart_id: CartId, buyer: BuyerRef, lines: Vec<CartLine>) -> Self {
        let summary = OrderSummary::for_lines(&lines);
        Self {
            id: SessionId::new(),
            cart_id,
            buyer,
            step: CheckoutStep::Shipping,
            lines,
            summary,
            shipping_address: None,
            sign_in_offer: None,
            payment_intent: None,
            pending_order: None,
            saved_addresses: Vec::new(),
            saved_payment_methods: Vec::new(),
            confirmation: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !self.buyer.is_guest()
    }
}

/// How long an untouched checkout session is kept.
pub const SESSION_IDLE_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// How long a confirmed session stays readable for the confirmation page.
pub const CONFIRMED_SESSION_TTL: Duration = Duration::from_secs(15 * 60);

/// How long an untouched cart is kept.
pub const CART_IDLE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug)]
struct Slot<V> {
    value: Arc<Mutex<V>>,
    ttl: Duration,
    expires_at: Instant,
}

impl<V> Slot<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Map of independently locked entries that expire when left idle.
///
/// Each entry sits behind its own mutex so one buyer's calls run one at a
/// time without blocking other buyers. Every `get` pushes the entry's expiry
/// out by its TTL. Expired entries are dropped on lookup and swept on insert.
#[derive(Debug)]
pub struct Registry<K, V> {
    entries: RwLock<HashMap<K, Slot<V>>>,
    ttl: Duration,
}

impl<K: Eq + Hash + Copy, V> Registry<K, V> {
    /// Creates a registry whose entries expire after `ttl` without access.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn insert(&self, key: K, value: V) -> Arc<Mutex<V>> {
        let now = Instant::now();
        let entry = Arc::new(Mutex::new(value));
        let mut entries = self.entries.write().await;
        entries.retain(|_, slot| slot.is_live(now));
        entries.insert(
            key,
            Slot {
                value: entry.clone(),
                ttl: self.ttl,
                expires_at: now + self.ttl,
            },
        );
        entry
    }

    pub async fn get(&self, key: K) -> Option<Arc<Mutex<V>>> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let slot = entries.get_mut(&key)?;
        if slot.is_live(now) {
            slot.expires_at = now + slot.ttl;
            return Some(slot.value.clone());
        }
        entries.remove(&key);
        None
    }

    /// Changes how long the entry lives from now on. Returns false when absent.
    pub async fn set_ttl(&self, key: K, ttl: Duration) -> bool {
        let now = Instant::now();
        match self.entries.write().await.get_mut(&key) {
            Some(slot) => {
                slot.ttl = ttl;
                slot.expires_at = now + ttl;
                true
            }
            None => false,
        }
    }

    pub async fn remove(&self, key: K) -> bool {
        self.entries.write().await.remove(&key).is_some()
    }

    /// Number of entries that have not expired.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|slot| slot.is_live(now))
            .count()
    }
}

pub type SessionRegistry = Registry<SessionId, CheckoutSession>;
pub type CartRegistry = Registry<CartId, Cart>;
