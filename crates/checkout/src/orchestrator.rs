//! Checkout orchestrator.

use std::sync::Arc;

use common::{BuyerId, BuyerRef, CartId, OrderId, ProductRef, SessionId};
use domain::{
    Cart, CartLine, NewOrder, NewOrderLine, Order, OrderLine, PaymentRefs, SavedAddress,
    ShippingProfile, UserProfile,
};
use serde::{Deserialize, Serialize};
use store::{AccountStore, AddressStore, PaymentMethodStore, Store, StoreError};
use tokio::sync::Mutex;

use crate::error::{CheckoutError, Result};
use crate::gateway::OrderGateway;
use crate::hooks::{PaidOrder, PostCommitHooks};
use crate::notifications::NotificationDispatcher;
use crate::order_number::OrderNumberGenerator;
use crate::services::email::Notifier;
use crate::services::payment::{PaymentGateway, PaymentIntent};
use crate::session::{
    CART_IDLE_TTL, CONFIRMED_SESSION_TTL, CartRegistry, CheckoutSession, Confirmation,
    PendingOrder, SESSION_IDLE_TTL, SessionRegistry, SignInOffer,
};
use crate::state::{CheckoutEvent, CheckoutStep, transition};

/// Shipping step input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingSubmission {
    #[serde(flatten)]
    pub address: ShippingProfile,
    /// Save the address to the buyer's account. Ignored for guests.
    #[serde(default)]
    pub save_address: bool,
}

/// Account step input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountChoice {
    pub create_account: bool,
    /// Defaults to the shipping email.
    #[serde(default)]
    pub email: Option<String>,
}

/// Payment step input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSubmission {
    /// Defaults to the shipping address.
    #[serde(default)]
    pub billing_address: Option<ShippingProfile>,
    /// Payment method confirmed client-side, used for the card summary.
    #[serde(default)]
    pub payment_method_id: Option<String>,
}

/// A persisted order with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

/// Drives carts and checkout sessions through
/// shipping → account → payment → confirmation.
///
/// Each session is locked for the duration of a call, so one buyer's steps
/// run strictly one after another.
pub struct CheckoutOrchestrator<S> {
    store: S,
    carts: CartRegistry,
    sessions: SessionRegistry,
    numbers: OrderNumberGenerator<S>,
    orders: OrderGateway<S>,
    payments: Arc<dyn PaymentGateway>,
    hooks: PostCommitHooks,
}

impl<S> CheckoutOrchestrator<S>
where
    S: Store + Clone + 'static,
{
    /// Creates an orchestrator with the standard post-commit hooks.
    pub fn new(store: S, payments: Arc<dyn PaymentGateway>, notifier: Arc<dyn Notifier>) -> Self {
        let hooks = PostCommitHooks::standard(
            store.clone(),
            payments.clone(),
            NotificationDispatcher::new(notifier),
        );
        Self::with_hooks(store, payments, hooks)
    }

    pub fn with_hooks(store: S, payments: Arc<dyn PaymentGateway>, hooks: PostCommitHooks) -> Self {
        Self {
            numbers: OrderNumberGenerator::new(store.clone()),
            orders: OrderGateway::new(store.clone()),
            store,
            carts: CartRegistry::new(CART_IDLE_TTL),
            sessions: SessionRegistry::new(SESSION_IDLE_TTL),
            payments,
            hooks,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn payments(&self) -> &Arc<dyn PaymentGateway> {
        &self.payments
    }

    /// Carts that have not expired or been purchased.
    pub async fn open_carts(&self) -> usize {
        self.carts.len().await
    }

    /// Checkout sessions that have not expired.
    pub async fn open_sessions(&self) -> usize {
        self.sessions.len().await
    }

    // Carts

    pub async fn create_cart(&self) -> Cart {
        let cart = Cart::new(CartId::new());
        self.carts.insert(cart.id(), cart.clone()).await;
        cart
    }

    pub async fn get_cart(&self, cart_id: CartId) -> Result<Cart> {
        Ok(self.cart_entry(cart_id).await?.lock().await.clone())
    }

    /// Adds a line, merging with an existing line for the same product.
    pub async fn add_to_cart(&self, cart_id: CartId, line: CartLine) -> Result<Cart> {
        let entry = self.cart_entry(cart_id).await?;
        let mut cart = entry.lock().await;
        cart.add_line(line)?;
        Ok(cart.clone())
    }

    /// Sets a line's quantity; zero removes the line.
    pub async fn set_cart_quantity(
        &self,
        cart_id: CartId,
        product_ref: &ProductRef,
        quantity: u32,
    ) -> Result<Cart> {
        let entry = self.cart_entry(cart_id).await?;
        let mut cart = entry.lock().await;
        cart.set_quantity(product_ref, quantity)?;
        Ok(cart.clone())
    }

    pub async fn remove_from_cart(&self, cart_id: CartId, product_ref: &ProductRef) -> Result<Cart> {
        let entry = self.cart_entry(cart_id).await?;
        let mut cart = entry.lock().await;
        cart.remove_line(product_ref)?;
        Ok(cart.clone())
    }

    async fn cart_entry(&self, cart_id: CartId) -> Result<Arc<Mutex<Cart>>> {
        self.carts
            .get(cart_id)
            .await
            .ok_or(CheckoutError::CartNotFound(cart_id))
    }

    // Checkout

    /// Starts a checkout from a snapshot of the cart.
    ///
    /// Authenticated buyers get their saved addresses and cards, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn start(&self, cart_id: CartId, buyer_id: Option<BuyerId>) -> Result<CheckoutSession> {
        let lines = self.cart_entry(cart_id).await?.lock().await.snapshot()?;
        let buyer = buyer_id.map_or(BuyerRef::Guest, BuyerRef::Account);

        let mut session = CheckoutSession::new(cart_id, buyer, lines);
        if let Some(buyer_id) = buyer_id {
            self.load_saved_details(&mut session, buyer_id).await?;
        }

        tracing::info!(session_id = %session.id, buyer = %buyer, "checkout started");
        self.sessions.insert(session.id, session.clone()).await;
        Ok(session)
    }

    pub async fn session(&self, session_id: SessionId) -> Result<CheckoutSession> {
        Ok(self.session_entry(session_id).await?.lock().await.clone())
    }

    /// Validates the shipping details and moves on.
    ///
    /// If the email belongs to an account and the buyer is not signed in,
    /// the session stays on shipping with a sign-in offer.
    #[tracing::instrument(skip(self, submission))]
    pub async fn submit_shipping(
        &self,
        session_id: SessionId,
        submission: ShippingSubmission,
    ) -> Result<CheckoutSession> {
        let entry = self.session_entry(session_id).await?;
        let mut session = entry.lock().await;
        ensure(session.step, CheckoutStep::can_submit_shipping, "submit shipping")?;

        submission.address.validate(true)?;
        let email = submission
            .address
            .email()
            .ok_or(domain::DomainError::MissingField("email"))?;
        session.shipping_address = Some(submission.address.clone());
        session.sign_in_offer = None;

        if let Some(buyer_id) = session.buyer.account() {
            if submission.save_address {
                let address = SavedAddress::new(buyer_id, submission.address);
                match self.store.save_address(&address).await {
                    Ok(()) => session.saved_addresses.insert(0, address),
                    Err(e) => tracing::warn!(error = %e, "could not save address"),
                }
            }
            session.step = transition(
                session.step,
                CheckoutEvent::ShippingAccepted { authenticated: true },
            )?;
        } else if self.store.find_account_by_email(&email).await?.is_some() {
            tracing::info!(step = %session.step, "shipping email has an account, offering sign-in");
            session.sign_in_offer = Some(SignInOffer { email });
            session.step = transition(session.step, CheckoutEvent::SignInOffered)?;
        } else {
            session.step = transition(
                session.step,
                CheckoutEvent::ShippingAccepted {
                    authenticated: false,
                },
            )?;
        }

        Ok(session.clone())
    }

    /// Accepts the sign-in offer with the buyer id issued by the auth platform.
    #[tracing::instrument(skip(self))]
    pub async fn sign_in(&self, session_id: SessionId, buyer_id: BuyerId) -> Result<CheckoutSession> {
        let entry = self.session_entry(session_id).await?;
        let mut session = entry.lock().await;
        if session.sign_in_offer.is_none() {
            return Err(CheckoutError::InvalidTransition {
                step: session.step,
                action: "sign in",
            });
        }

        session.step = transition(session.step, CheckoutEvent::SignedIn)?;
        session.sign_in_offer = None;
        session.buyer = BuyerRef::Account(buyer_id);
        self.load_saved_details(&mut session, buyer_id).await?;
        Ok(session.clone())
    }

    /// Declines the sign-in offer and continues to the account step.
    #[tracing::instrument(skip(self))]
    pub async fn decline_sign_in(&self, session_id: SessionId) -> Result<CheckoutSession> {
        let entry = self.session_entry(session_id).await?;
        let mut session = entry.lock().await;
        if session.sign_in_offer.is_none() {
            return Err(CheckoutError::InvalidTransition {
                step: session.step,
                action: "decline sign-in",
            });
        }

        session.step = transition(session.step, CheckoutEvent::SignInDeclined)?;
        session.sign_in_offer = None;
        Ok(session.clone())
    }

    /// Creates an account from the shipping details, or continues as guest.
    ///
    /// An email that already has an account is rejected, never merged.
    #[tracing::instrument(skip(self, choice), fields(create_account = choice.create_account))]
    pub async fn choose_account(
        &self,
        session_id: SessionId,
        choice: AccountChoice,
    ) -> Result<CheckoutSession> {
        let entry = self.session_entry(session_id).await?;
        let mut session = entry.lock().await;
        ensure(session.step, CheckoutStep::can_choose_account, "choose account")?;

        if !choice.create_account {
            session.step = transition(session.step, CheckoutEvent::ContinuedAsGuest)?;
            return Ok(session.clone());
        }

        let shipping = session
            .shipping_address
            .clone()
            .ok_or(domain::DomainError::MissingField("shipping_address"))?;
        let email = choice
            .email
            .map(|e| e.trim().to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .or_else(|| shipping.email())
            .ok_or(domain::DomainError::MissingField("email"))?;

        if self.store.find_account_by_email(&email).await?.is_some() {
            return Err(CheckoutError::AccountExists(email));
        }

        let profile = UserProfile::from_shipping(BuyerId::new(), &email, &shipping);
        self.store
            .create_account(&profile)
            .await
            .map_err(|e| match e {
                StoreError::DuplicateAccount(email) => CheckoutError::AccountExists(email),
                other => CheckoutError::Store(other),
            })?;

        let mut address = SavedAddress::new(profile.id, shipping);
        address.is_default = true;
        if let Err(e) = self.store.save_address(&address).await {
            tracing::warn!(error = %e, "could not save address for new account");
        } else {
            session.saved_addresses = vec![address];
        }

        tracing::info!(buyer_id = %profile.id, "account created during checkout");
        session.buyer = BuyerRef::Account(profile.id);
        session.step = transition(session.step, CheckoutEvent::AccountCreated)?;
        Ok(session.clone())
    }

    /// Creates the payment intent for the session total.
    ///
    /// Calling it again returns the same intent.
    #[tracing::instrument(skip(self))]
    pub async fn begin_payment(&self, session_id: SessionId) -> Result<PaymentIntent> {
        let entry = self.session_entry(session_id).await?;
        let mut session = entry.lock().await;
        ensure(session.step, CheckoutStep::can_pay, "begin payment")?;

        if let Some(intent) = &session.payment_intent {
            return Ok(intent.clone());
        }

        let intent = self.payments.create_intent(session.summary.total).await?;
        tracing::info!(intent_id = %intent.id, total = %session.summary.total, "payment intent ready");
        session.payment_intent = Some(intent.clone());
        Ok(intent)
    }

    /// Places the order once the client has confirmed the payment intent.
    ///
    /// Order and line failures are retryable and keep the session on the
    /// payment step. Once an order is written, a retry pays that same order.
    /// Anything after the order is paid is best-effort.
    #[tracing::instrument(skip(self, submission))]
    pub async fn submit_payment(
        &self,
        session_id: SessionId,
        submission: PaymentSubmission,
    ) -> Result<Confirmation> {
        metrics::counter!("checkout_submissions_total").increment(1);
        let started = std::time::Instant::now();

        let entry = self.session_entry(session_id).await?;
        let mut session = entry.lock().await;

        let result = self.place_order(&mut session, submission).await;
        match &result {
            Ok(confirmation) => {
                metrics::counter!("checkout_completed_total").increment(1);
                tracing::info!(
                    order_id = %confirmation.order_id,
                    order_number = %confirmation.order_number,
                    "checkout completed"
                );
            }
            Err(e) => {
                metrics::counter!("checkout_failed_total", "reason" => e.reason()).increment(1);
                tracing::warn!(error = %e, retryable = e.is_retryable(), "checkout failed");
            }
        }
        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());

        result
    }

    async fn place_order(
        &self,
        session: &mut CheckoutSession,
        submission: PaymentSubmission,
    ) -> Result<Confirmation> {
        ensure(session.step, CheckoutStep::can_pay, "complete payment")?;
        let intent = session
            .payment_intent
            .clone()
            .ok_or(CheckoutError::MissingPaymentIntent)?;
        let shipping = session
            .shipping_address
            .clone()
            .ok_or(domain::DomainError::MissingField("shipping_address"))?;
        let billing = submission.billing_address.unwrap_or_else(|| shipping.clone());
        billing.validate(false)?;

        // An unpaid order from an earlier attempt is reused while it still
        // describes this checkout. A stale one is failed so it never lingers.
        let buyer = session.buyer;
        if let Some(stale) = session
            .pending_order
            .take_if(|pending| !pending.matches(&intent.id, buyer, &shipping, &billing))
        {
            self.abandon_order(stale.order.id).await;
        }

        let PendingOrder { order, lines, .. } = match session.pending_order.clone() {
            Some(pending) => {
                tracing::info!(order_id = %pending.order.id, "resuming pending order");
                pending
            }
            None => {
                let pending = self
                    .write_pending_order(session, &intent.id, &shipping, billing)
                    .await?;
                session.pending_order = Some(pending.clone());
                pending
            }
        };

        // 4. Verify the payment; an unconfirmed order stays pending
        let confirmed = self.payments.retrieve_intent(&intent.id).await?;
        if !confirmed.status.is_succeeded() {
            tracing::warn!(
                order_id = %order.id,
                intent_id = %confirmed.id,
                status = %confirmed.status,
                "payment not confirmed, order left pending"
            );
            return Err(CheckoutError::PaymentNotConfirmed {
                intent_id: confirmed.id,
                status: confirmed.status.to_string(),
            });
        }

        // 5. Paid
        let paid = match self
            .orders
            .mark_paid(
                order.id,
                &PaymentRefs::new(confirmed.id.clone(), confirmed.status.as_str()),
            )
            .await
        {
            Ok(paid) => paid,
            Err(e) => {
                // The order was moved or removed elsewhere; the next attempt writes a new one.
                if matches!(e, CheckoutError::Validation(_) | CheckoutError::OrderNotFound(_)) {
                    session.pending_order = None;
                }
                return Err(e);
            }
        };
        session.pending_order = None;

        // 6. Best-effort hooks
        let payment_method_id = submission.payment_method_id.or(confirmed.payment_method);
        let mut paid = PaidOrder::new(paid, lines, session.summary, payment_method_id);
        self.hooks.run(&mut paid).await;

        // 7. Release the purchased cart
        self.carts.remove(session.cart_id).await;

        let confirmation = Confirmation {
            order_id: paid.order().id,
            order_number: paid.order().order_number.clone(),
            lines: paid.lines().to_vec(),
            summary: *paid.summary(),
            shipping_address: shipping,
            payment_method: paid.payment_method.clone(),
        };
        session.step = transition(session.step, CheckoutEvent::PaymentSucceeded)?;
        session.confirmation = Some(confirmation.clone());
        self.sessions.set_ttl(session.id, CONFIRMED_SESSION_TTL).await;
        Ok(confirmation)
    }

    /// Steps 1 to 3: order number, pending order, then its lines.
    ///
    /// A line failure deletes the order again, so an error leaves nothing behind.
    async fn write_pending_order(
        &self,
        session: &CheckoutSession,
        intent_id: &str,
        shipping: &ShippingProfile,
        billing: ShippingProfile,
    ) -> Result<PendingOrder> {
        // 1. Order number
        let order_number = self.numbers.next().await?;

        // 2. Pending order
        let guest_email = if session.buyer.is_guest() {
            shipping.email()
        } else {
            None
        };
        let order = self
            .orders
            .create_order(NewOrder {
                buyer: session.buyer,
                order_number,
                shipping_address: shipping.clone(),
                billing_address: billing,
                total_amount: session.summary.total,
                guest_email,
            })
            .await?;

        // 3. Lines, deleting the order on failure
        let lines = self
            .orders
            .create_order_lines(order.id, session.lines.iter().map(NewOrderLine::from).collect())
            .await?;

        Ok(PendingOrder {
            intent_id: intent_id.to_string(),
            order,
            lines,
        })
    }

    async fn abandon_order(&self, order_id: OrderId) {
        if let Err(e) = self
            .orders
            .mark_failed(order_id, "superseded by a new checkout attempt")
            .await
        {
            tracing::warn!(%order_id, error = %e, "could not fail superseded order");
        }
    }

    /// Goes back one step.
    #[tracing::instrument(skip(self))]
    pub async fn back(&self, session_id: SessionId) -> Result<CheckoutSession> {
        let entry = self.session_entry(session_id).await?;
        let mut session = entry.lock().await;
        let authenticated = session.is_authenticated();
        session.step = transition(session.step, CheckoutEvent::Back { authenticated })?;
        session.sign_in_offer = None;
        Ok(session.clone())
    }

    // Orders

    pub async fn order(&self, order_id: OrderId) -> Result<OrderDetails> {
        let order = self.orders.get_order(order_id).await?;
        let lines = self.orders.get_order_lines(order_id).await?;
        Ok(OrderDetails { order, lines })
    }

    /// Marks an abandoned pending order failed.
    pub async fn fail_order(&self, order_id: OrderId, reason: &str) -> Result<Order> {
        self.orders.mark_failed(order_id, reason).await
    }

    async fn session_entry(&self, session_id: SessionId) -> Result<Arc<Mutex<CheckoutSession>>> {
        self.sessions
            .get(session_id)
            .await
            .ok_or(CheckoutError::SessionNotFound(session_id))
    }

    async fn load_saved_details(
        &self,
        session: &mut CheckoutSession,
        buyer_id: BuyerId,
    ) -> Result<()> {
        session.saved_addresses = self.store.list_addresses(buyer_id).await?;
        session.saved_payment_methods = self.store.list_payment_methods(buyer_id).await?;
        Ok(())
    }
}

fn ensure(
    step: CheckoutStep,
    allowed: fn(&CheckoutStep) -> bool,
    action: &'static str,
) -> Result<()> {
    if allowed(&step) {
        Ok(())
    } else {
        Err(CheckoutError::InvalidTransition { step, action })
    }
}
