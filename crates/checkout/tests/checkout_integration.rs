//! Integration tests for the checkout flow.

use std::collections::HashSet;
use std::sync::Arc;

use checkout::{
    AccountChoice, CheckoutError, CheckoutOrchestrator, CheckoutStep, EmailKind,
    InMemoryNotifier, InMemoryPaymentGateway, OrderGateway, OrderNumberGenerator,
    PaymentSubmission, ShippingSubmission,
};
use chrono::Utc;
use common::{BuyerId, BuyerRef, CartId, OrderId, SessionId};
use domain::{
    CartLine, Money, NewOrder, OrderNumber, OrderStatus, PaymentMethodSummary, SavedAddress, SavedPaymentMethod,
    ShippingProfile, StockRecord, UserProfile,
};
use store::{AccountStore, AddressStore, InMemoryStore, PaymentMethodStore, StockStore};
use uuid::Uuid;

struct TestHarness {
    orchestrator: Arc<CheckoutOrchestrator<InMemoryStore>>,
    store: InMemoryStore,
    payments: InMemoryPaymentGateway,
    notifier: InMemoryNotifier,
}

impl TestHarness {
    fn new() -> Self {
        let store = InMemoryStore::new();
        let payments = InMemoryPaymentGateway::new();
        let notifier = InMemoryNotifier::new();
        let orchestrator = CheckoutOrchestrator::new(
            store.clone(),
            Arc::new(payments.clone()),
            Arc::new(notifier.clone()),
        );

        Self {
            orchestrator: Arc::new(orchestrator),
            store,
            payments,
            notifier,
        }
    }

    async fn cart_with(&self, lines: &[(&str, i64, u32)]) -> CartId {
        let cart = self.orchestrator.create_cart().await;
        for (product, cents, quantity) in lines {
            self.orchestrator
                .add_to_cart(
                    cart.id(),
                    CartLine::new(*product, format!("Product {product}"), Money::from_cents(*cents), *quantity),
                )
                .await
                .unwrap();
        }
        cart.id()
    }

    async fn stock(&self, product: &str, quantity: i64) {
        self.store
            .upsert_stock(&StockRecord::new(product, quantity))
            .await
            .unwrap();
    }

    /// Drives a guest session up to the payment step with a created intent.
    async fn guest_at_payment(&self, cart_id: CartId) -> (SessionId, String) {
        let session = self.orchestrator.start(cart_id, None).await.unwrap();
        self.orchestrator
            .submit_shipping(session.id, shipping("guest@example.com"))
            .await
            .unwrap();
        self.orchestrator
            .choose_account(session.id, AccountChoice::default())
            .await
            .unwrap();
        let intent = self.orchestrator.begin_payment(session.id).await.unwrap();
        (session.id, intent.id)
    }
}

fn address(email: &str) -> ShippingProfile {
    ShippingProfile {
        first_name: "Coral".to_string(),
        last_name: "Diver".to_string(),
        address_line1: "9 Lagoon Ln".to_string(),
        address_line2: None,
        city: "Key West".to_string(),
        state: "FL".to_string(),
        postal_code: "33040".to_string(),
        phone: "555-0123".to_string(),
        email: Some(email.to_string()),
    }
}

fn shipping(email: &str) -> ShippingSubmission {
    ShippingSubmission {
        address: address(email),
        save_address: false,
    }
}

#[tokio::test]
async fn test_guest_checkout_scenario_under_threshold() {
    let harness = TestHarness::new();
    harness.stock("rbta", 10).await;
    let cart_id = harness.cart_with(&[("rbta", 1000, 3)]).await;
    let (session_id, intent_id) = harness.guest_at_payment(cart_id).await;

    harness.payments.add_card("pm_visa", "visa", "4242");
    harness.payments.confirm(&intent_id, Some("pm_visa"));

    let confirmation = harness
        .orchestrator
        .submit_payment(session_id, PaymentSubmission::default())
        .await
        .unwrap();

    assert_eq!(confirmation.summary.subtotal, Money::from_cents(3000));
    assert_eq!(confirmation.summary.tax, Money::from_cents(210));
    assert_eq!(confirmation.summary.shipping, Money::from_cents(1500));
    assert_eq!(confirmation.summary.total, Money::from_cents(4710));
    assert_eq!(confirmation.payment_method, PaymentMethodSummary::new("visa", "4242"));

    let details = harness.orchestrator.order(confirmation.order_id).await.unwrap();
    assert_eq!(details.order.status, OrderStatus::Paid);
    assert_eq!(details.order.total_amount, Money::from_cents(4710));
    assert!(details.order.is_guest());
    assert_eq!(details.order.guest_email.as_deref(), Some("guest@example.com"));
    assert_eq!(details.lines.len(), 1);
    assert_eq!(
        details.order.payment.as_ref().map(|p| p.payment_intent_id.as_str()),
        Some(intent_id.as_str())
    );

    let session = harness.orchestrator.session(session_id).await.unwrap();
    assert_eq!(session.step, CheckoutStep::Confirmation);
    assert!(matches!(
        harness.orchestrator.get_cart(cart_id).await,
        Err(CheckoutError::CartNotFound(_))
    ));
    assert_eq!(harness.orchestrator.open_carts().await, 0);

    let record = harness.store.get_stock(&"rbta".into()).await.unwrap().unwrap();
    assert_eq!(record.quantity_on_hand, 7);
    assert_eq!(harness.notifier.count(EmailKind::Customer), 1);
    assert_eq!(harness.notifier.count(EmailKind::Operator), 1);
}

#[tokio::test]
async fn test_free_shipping_scenario() {
    let harness = TestHarness::new();
    harness.payments.set_auto_confirm(true);
    let cart_id = harness.cart_with(&[("tank", 25_000, 1)]).await;
    let (session_id, _) = harness.guest_at_payment(cart_id).await;

    let confirmation = harness
        .orchestrator
        .submit_payment(session_id, PaymentSubmission::default())
        .await
        .unwrap();

    assert_eq!(confirmation.summary.shipping, Money::zero());
    assert_eq!(confirmation.summary.tax, Money::from_cents(1750));
    assert_eq!(confirmation.summary.total, Money::from_cents(26_750));
    // No payment method id: card details fall back.
    assert_eq!(confirmation.payment_method, PaymentMethodSummary::fallback());
}

#[tokio::test]
async fn test_concurrent_order_numbers_are_unique() {
    let store = InMemoryStore::new();
    let generator = Arc::new(OrderNumberGenerator::new(store));

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let generator = generator.clone();
            tokio::spawn(async move { generator.next().await.unwrap() })
        })
        .collect();

    let mut numbers = HashSet::new();
    for handle in handles {
        assert!(numbers.insert(handle.await.unwrap()));
    }
    assert_eq!(numbers.len(), 50);
}

#[tokio::test]
async fn test_concurrent_checkouts_get_distinct_orders() {
    let harness = TestHarness::new();
    harness.payments.set_auto_confirm(true);

    let mut sessions = Vec::new();
    for _ in 0..10 {
        let cart_id = harness.cart_with(&[("frag", 1500, 1)]).await;
        sessions.push(harness.guest_at_payment(cart_id).await.0);
    }

    let handles: Vec<_> = sessions
        .into_iter()
        .map(|session_id| {
            let orchestrator = harness.orchestrator.clone();
            tokio::spawn(async move {
                orchestrator
                    .submit_payment(session_id, PaymentSubmission::default())
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut numbers = HashSet::new();
    for handle in handles {
        let confirmation = handle.await.unwrap();
        assert!(numbers.insert(confirmation.order_number));
    }
    assert_eq!(harness.store.order_count().await, 10);
}

#[tokio::test]
async fn test_line_failure_leaves_no_order_and_can_retry() {
    let harness = TestHarness::new();
    harness.payments.set_auto_confirm(true);
    let cart_id = harness.cart_with(&[("rbta", 1000, 2)]).await;
    let (session_id, _) = harness.guest_at_payment(cart_id).await;

    harness.store.set_fail_on_insert_order_lines(true).await;
    let err = harness
        .orchestrator
        .submit_payment(session_id, PaymentSubmission::default())
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::Persistence(_)));
    assert!(err.is_retryable());
    assert_eq!(harness.store.order_count().await, 0);
    assert_eq!(harness.store.order_line_count().await, 0);
    let session = harness.orchestrator.session(session_id).await.unwrap();
    assert_eq!(session.step, CheckoutStep::Payment);
    assert!(!harness.orchestrator.get_cart(cart_id).await.unwrap().is_empty());

    harness.store.set_fail_on_insert_order_lines(false).await;
    harness
        .orchestrator
        .submit_payment(session_id, PaymentSubmission::default())
        .await
        .unwrap();
    assert_eq!(harness.store.order_count().await, 1);
}

#[tokio::test]
async fn test_order_number_failure_writes_nothing() {
    let harness = TestHarness::new();
    harness.payments.set_auto_confirm(true);
    let cart_id = harness.cart_with(&[("rbta", 1000, 1)]).await;
    let (session_id, _) = harness.guest_at_payment(cart_id).await;

    harness.store.set_fail_on_next_value(true).await;
    let err = harness
        .orchestrator
        .submit_payment(session_id, PaymentSubmission::default())
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::OrderNumber(_)));
    assert_eq!(harness.store.order_count().await, 0);
}

#[tokio::test]
async fn test_unconfirmed_payment_leaves_order_pending() {
    let harness = TestHarness::new();
    let cart_id = harness.cart_with(&[("rbta", 1000, 1)]).await;
    let (session_id, intent_id) = harness.guest_at_payment(cart_id).await;
    harness.payments.decline(&intent_id);

    let err = harness
        .orchestrator
        .submit_payment(session_id, PaymentSubmission::default())
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::PaymentNotConfirmed { .. }));
    assert_eq!(harness.store.order_count().await, 1);
    let session = harness.orchestrator.session(session_id).await.unwrap();
    assert_eq!(session.step, CheckoutStep::Payment);
    assert!(harness.notifier.sent().is_empty());

    // Once the buyer confirms, the same pending order is paid.
    harness.payments.confirm(&intent_id, None);
    let confirmation = harness
        .orchestrator
        .submit_payment(session_id, PaymentSubmission::default())
        .await
        .unwrap();
    assert_eq!(harness.store.order_count().await, 1);
    assert_eq!(harness.store.order_line_count().await, 1);
    let details = harness.orchestrator.order(confirmation.order_id).await.unwrap();
    assert_eq!(details.order.status, OrderStatus::Paid);
}

#[tokio::test]
async fn test_retry_after_mark_paid_failure_reuses_order() {
    let harness = TestHarness::new();
    harness.payments.set_auto_confirm(true);
    let cart_id = harness.cart_with(&[("rbta", 1000, 2)]).await;
    let (session_id, _) = harness.guest_at_payment(cart_id).await;

    harness.store.set_fail_on_update_status(true).await;
    let err = harness
        .orchestrator
        .submit_payment(session_id, PaymentSubmission::default())
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(harness.store.order_count().await, 1);
    let session = harness.orchestrator.session(session_id).await.unwrap();
    assert_eq!(session.step, CheckoutStep::Payment);

    harness.store.set_fail_on_update_status(false).await;
    let confirmation = harness
        .orchestrator
        .submit_payment(session_id, PaymentSubmission::default())
        .await
        .unwrap();

    assert_eq!(harness.store.order_count().await, 1);
    assert_eq!(harness.store.order_line_count().await, 1);
    let details = harness.orchestrator.order(confirmation.order_id).await.unwrap();
    assert_eq!(details.order.status, OrderStatus::Paid);
    assert_eq!(harness.notifier.count(EmailKind::Customer), 1);
}

#[tokio::test]
async fn test_changed_billing_address_supersedes_pending_order() {
    let harness = TestHarness::new();
    let cart_id = harness.cart_with(&[("rbta", 1000, 1)]).await;
    let (session_id, intent_id) = harness.guest_at_payment(cart_id).await;

    let err = harness
        .orchestrator
        .submit_payment(session_id, PaymentSubmission::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::PaymentNotConfirmed { .. }));
    let session = harness.orchestrator.session(session_id).await.unwrap();
    assert!(session.pending_order.is_some());
    let first_order = session.pending_order.unwrap().order.id;

    harness.payments.confirm(&intent_id, None);
    let mut billing = address("billing@example.com");
    billing.address_line1 = "1 Reef Rd".to_string();
    let confirmation = harness
        .orchestrator
        .submit_payment(
            session_id,
            PaymentSubmission {
                billing_address: Some(billing),
                payment_method_id: None,
            },
        )
        .await
        .unwrap();

    assert_ne!(confirmation.order_id, first_order);
    assert_eq!(harness.store.order_count().await, 2);
    let superseded = harness.orchestrator.order(first_order).await.unwrap();
    assert_eq!(superseded.order.status, OrderStatus::Failed);
    let paid = harness.orchestrator.order(confirmation.order_id).await.unwrap();
    assert_eq!(paid.order.status, OrderStatus::Paid);
    assert_eq!(paid.order.billing_address.address_line1, "1 Reef Rd");
}

#[tokio::test]
async fn test_completed_checkout_releases_cart() {
    let harness = TestHarness::new();
    harness.payments.set_auto_confirm(true);
    let kept = harness.cart_with(&[("clown", 2999, 1)]).await;
    let cart_id = harness.cart_with(&[("rbta", 1000, 1)]).await;
    let (session_id, _) = harness.guest_at_payment(cart_id).await;
    assert_eq!(harness.orchestrator.open_carts().await, 2);
    assert_eq!(harness.orchestrator.open_sessions().await, 1);

    harness
        .orchestrator
        .submit_payment(session_id, PaymentSubmission::default())
        .await
        .unwrap();

    assert_eq!(harness.orchestrator.open_carts().await, 1);
    assert!(harness.orchestrator.get_cart(kept).await.is_ok());
    // The confirmation stays readable for a while.
    let session = harness.orchestrator.session(session_id).await.unwrap();
    assert!(session.confirmation.is_some());
}

#[tokio::test]
async fn test_pending_order_can_be_failed_for_reconciliation() {
    let harness = TestHarness::new();
    let gateway = OrderGateway::new(harness.store.clone());
    let order = gateway
        .create_order(NewOrder {
            buyer: BuyerRef::Guest,
            order_number: OrderNumber::from_string("ORD-240307-77"),
            shipping_address: address("guest@example.com"),
            billing_address: address("guest@example.com"),
            total_amount: Money::from_cents(4710),
            guest_email: Some("guest@example.com".to_string()),
        })
        .await
        .unwrap();

    let failed = harness
        .orchestrator
        .fail_order(order.id, "payment abandoned")
        .await
        .unwrap();
    assert_eq!(failed.status, OrderStatus::Failed);

    let err = harness
        .orchestrator
        .order(OrderId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::OrderNotFound(_)));
}

#[tokio::test]
async fn test_email_failure_after_payment_is_not_surfaced() {
    let harness = TestHarness::new();
    harness.payments.set_auto_confirm(true);
    harness.notifier.set_fail_on_customer(true);
    harness.notifier.set_fail_on_operator(true);
    let cart_id = harness.cart_with(&[("rbta", 1000, 3)]).await;
    let (session_id, _) = harness.guest_at_payment(cart_id).await;

    let confirmation = harness
        .orchestrator
        .submit_payment(session_id, PaymentSubmission::default())
        .await
        .unwrap();

    let details = harness.orchestrator.order(confirmation.order_id).await.unwrap();
    assert_eq!(details.order.status, OrderStatus::Paid);
    assert!(harness.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_stock_is_clamped_and_flagged() {
    let harness = TestHarness::new();
    harness.payments.set_auto_confirm(true);
    harness.stock("last-one", 1).await;
    harness.stock("none-left", 0).await;
    let cart_id = harness
        .cart_with(&[("last-one", 5000, 1), ("none-left", 2000, 2)])
        .await;
    let (session_id, _) = harness.guest_at_payment(cart_id).await;

    harness
        .orchestrator
        .submit_payment(session_id, PaymentSubmission::default())
        .await
        .unwrap();

    for product in ["last-one", "none-left"] {
        let record = harness.store.get_stock(&product.into()).await.unwrap().unwrap();
        assert_eq!(record.quantity_on_hand, 0);
        assert!(record.disabled);
        assert!(record.sold_out);
    }
}

#[tokio::test]
async fn test_existing_email_gets_declinable_sign_in_offer() {
    let harness = TestHarness::new();
    let existing = UserProfile::from_shipping(BuyerId::new(), "member@example.com", &address("member@example.com"));
    harness.store.create_account(&existing).await.unwrap();

    let cart_id = harness.cart_with(&[("rbta", 1000, 1)]).await;
    let session = harness.orchestrator.start(cart_id, None).await.unwrap();

    let offered = harness
        .orchestrator
        .submit_shipping(session.id, shipping("Member@Example.com"))
        .await
        .unwrap();
    assert_eq!(offered.step, CheckoutStep::Shipping);
    assert_eq!(
        offered.sign_in_offer.as_ref().map(|o| o.email.as_str()),
        Some("member@example.com")
    );

    let declined = harness.orchestrator.decline_sign_in(session.id).await.unwrap();
    assert_eq!(declined.step, CheckoutStep::Account);
    assert!(declined.sign_in_offer.is_none());

    let err = harness
        .orchestrator
        .choose_account(
            session.id,
            AccountChoice {
                create_account: true,
                email: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::AccountExists(_)));

    let guest = harness
        .orchestrator
        .choose_account(session.id, AccountChoice::default())
        .await
        .unwrap();
    assert_eq!(guest.step, CheckoutStep::Payment);
    assert!(guest.buyer.is_guest());
}

#[tokio::test]
async fn test_sign_in_skips_account_step() {
    let harness = TestHarness::new();
    let buyer_id = BuyerId::new();
    let existing = UserProfile::from_shipping(buyer_id, "member@example.com", &address("member@example.com"));
    harness.store.create_account(&existing).await.unwrap();

    let cart_id = harness.cart_with(&[("rbta", 1000, 1)]).await;
    let session = harness.orchestrator.start(cart_id, None).await.unwrap();
    harness
        .orchestrator
        .submit_shipping(session.id, shipping("member@example.com"))
        .await
        .unwrap();

    let signed_in = harness.orchestrator.sign_in(session.id, buyer_id).await.unwrap();
    assert_eq!(signed_in.step, CheckoutStep::Payment);
    assert_eq!(signed_in.buyer.account(), Some(buyer_id));

    let back = harness.orchestrator.back(session.id).await.unwrap();
    assert_eq!(back.step, CheckoutStep::Shipping);
}

#[tokio::test]
async fn test_sign_in_without_offer_is_rejected() {
    let harness = TestHarness::new();
    let cart_id = harness.cart_with(&[("rbta", 1000, 1)]).await;
    let session = harness.orchestrator.start(cart_id, None).await.unwrap();

    let err = harness
        .orchestrator
        .sign_in(session.id, BuyerId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_create_account_during_checkout() {
    let harness = TestHarness::new();
    let cart_id = harness.cart_with(&[("rbta", 1000, 1)]).await;
    let session = harness.orchestrator.start(cart_id, None).await.unwrap();
    harness
        .orchestrator
        .submit_shipping(session.id, shipping("new@example.com"))
        .await
        .unwrap();

    let created = harness
        .orchestrator
        .choose_account(
            session.id,
            AccountChoice {
                create_account: true,
                email: None,
            },
        )
        .await
        .unwrap();

    let buyer_id = created.buyer.account().unwrap();
    assert_eq!(created.step, CheckoutStep::Payment);
    assert!(harness.store.get_account(buyer_id).await.unwrap().is_some());
    let addresses = harness.store.list_addresses(buyer_id).await.unwrap();
    assert_eq!(addresses.len(), 1);
    assert!(addresses[0].is_default);

    let back = harness.orchestrator.back(session.id).await.unwrap();
    assert_eq!(back.step, CheckoutStep::Shipping);
}

#[tokio::test]
async fn test_authenticated_start_loads_saved_details() {
    let harness = TestHarness::new();
    let buyer_id = BuyerId::new();
    let older = SavedAddress::new(buyer_id, address("a@example.com"));
    let mut newer = SavedAddress::new(buyer_id, address("b@example.com"));
    newer.created_at = older.created_at + chrono::Duration::seconds(5);
    harness.store.save_address(&older).await.unwrap();
    harness.store.save_address(&newer).await.unwrap();
    harness
        .store
        .save_payment_method(&SavedPaymentMethod {
            id: Uuid::new_v4(),
            buyer_id,
            card_brand: "visa".to_string(),
            last_four: "4242".to_string(),
            expiry_month: 12,
            expiry_year: 2030,
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    let cart_id = harness.cart_with(&[("rbta", 1000, 1)]).await;
    let session = harness.orchestrator.start(cart_id, Some(buyer_id)).await.unwrap();

    assert!(session.is_authenticated());
    assert_eq!(session.saved_addresses.len(), 2);
    assert_eq!(session.saved_addresses[0].id, newer.id);
    assert_eq!(session.saved_payment_methods.len(), 1);

    let submitted = harness
        .orchestrator
        .submit_shipping(
            session.id,
            ShippingSubmission {
                address: address("b@example.com"),
                save_address: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(submitted.step, CheckoutStep::Payment);
    assert_eq!(harness.store.list_addresses(buyer_id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_invalid_shipping_has_no_side_effects() {
    let harness = TestHarness::new();
    let cart_id = harness.cart_with(&[("rbta", 1000, 1)]).await;
    let session = harness.orchestrator.start(cart_id, None).await.unwrap();

    let mut bad = shipping("guest@example.com");
    bad.address.email = None;
    let err = harness
        .orchestrator
        .submit_shipping(session.id, bad)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::Validation(_)));
    let session = harness.orchestrator.session(session.id).await.unwrap();
    assert_eq!(session.step, CheckoutStep::Shipping);
    assert!(session.shipping_address.is_none());
}

#[tokio::test]
async fn test_payment_requires_intent() {
    let harness = TestHarness::new();
    let cart_id = harness.cart_with(&[("rbta", 1000, 1)]).await;
    let session = harness.orchestrator.start(cart_id, None).await.unwrap();
    harness
        .orchestrator
        .submit_shipping(session.id, shipping("guest@example.com"))
        .await
        .unwrap();
    harness
        .orchestrator
        .choose_account(session.id, AccountChoice::default())
        .await
        .unwrap();

    let err = harness
        .orchestrator
        .submit_payment(session.id, PaymentSubmission::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::MissingPaymentIntent));
}

#[tokio::test]
async fn test_begin_payment_reuses_intent() {
    let harness = TestHarness::new();
    let cart_id = harness.cart_with(&[("rbta", 1000, 1)]).await;
    let (session_id, intent_id) = harness.guest_at_payment(cart_id).await;

    let again = harness.orchestrator.begin_payment(session_id).await.unwrap();
    assert_eq!(again.id, intent_id);
    assert_eq!(harness.payments.intent_count(), 1);
}

#[tokio::test]
async fn test_confirmation_is_terminal() {
    let harness = TestHarness::new();
    harness.payments.set_auto_confirm(true);
    let cart_id = harness.cart_with(&[("rbta", 1000, 1)]).await;
    let (session_id, _) = harness.guest_at_payment(cart_id).await;
    harness
        .orchestrator
        .submit_payment(session_id, PaymentSubmission::default())
        .await
        .unwrap();

    assert!(harness.orchestrator.back(session_id).await.is_err());
    let err = harness
        .orchestrator
        .submit_payment(session_id, PaymentSubmission::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::InvalidTransition { .. }));
    assert_eq!(harness.store.order_count().await, 1);
}

#[tokio::test]
async fn test_empty_cart_cannot_start_checkout() {
    let harness = TestHarness::new();
    let cart = harness.orchestrator.create_cart().await;

    let err = harness.orchestrator.start(cart.id(), None).await.unwrap_err();
    assert!(matches!(err, CheckoutError::Validation(_)));
}
