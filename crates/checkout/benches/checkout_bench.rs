use std::sync::Arc;

use checkout::state::transition;
use checkout::{
    AccountChoice, CheckoutEvent, CheckoutOrchestrator, CheckoutStep, InMemoryNotifier,
    InMemoryPaymentGateway, PaymentSubmission, ShippingSubmission,
};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{CartLine, Money, ShippingProfile, StockRecord};
use std::hint::black_box;
use store::{InMemoryStore, StockStore};

fn bench_state_machine(c: &mut Criterion) {
    c.bench_function("checkout/guest_path_transitions", |b| {
        b.iter(|| {
            let step = transition(
                black_box(CheckoutStep::Shipping),
                CheckoutEvent::ShippingAccepted { authenticated: false },
            )
            .unwrap();
            let step = transition(step, CheckoutEvent::ContinuedAsGuest).unwrap();
            transition(step, CheckoutEvent::PaymentSucceeded).unwrap()
        });
    });
}

fn shipping() -> ShippingSubmission {
    ShippingSubmission {
        address: ShippingProfile {
            first_name: "Bench".to_string(),
            last_name: "Buyer".to_string(),
            address_line1: "1 Reef Rd".to_string(),
            city: "Tampa".to_string(),
            state: "FL".to_string(),
            postal_code: "33601".to_string(),
            phone: "555-0100".to_string(),
            email: Some("bench@example.com".to_string()),
            ..Default::default()
        },
        save_address: false,
    }
}

fn bench_guest_checkout(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    let payments = InMemoryPaymentGateway::new();
    payments.set_auto_confirm(true);
    let orchestrator = CheckoutOrchestrator::new(
        store.clone(),
        Arc::new(payments),
        Arc::new(InMemoryNotifier::new()),
    );
    rt.block_on(async {
        store
            .upsert_stock(&StockRecord::new("SKU-BENCH", i64::MAX / 2))
            .await
            .unwrap()
    });

    c.bench_function("checkout/guest_checkout_in_memory", |b| {
        b.iter(|| {
            rt.block_on(async {
                let cart = orchestrator.create_cart().await;
                orchestrator
                    .add_to_cart(
                        cart.id(),
                        CartLine::new("SKU-BENCH", "Bench Frag", Money::from_cents(1000), 3),
                    )
                    .await
                    .unwrap();
                let session = orchestrator.start(cart.id(), None).await.unwrap();
                orchestrator.submit_shipping(session.id, shipping()).await.unwrap();
                orchestrator
                    .choose_account(session.id, AccountChoice::default())
                    .await
                    .unwrap();
                orchestrator.begin_payment(session.id).await.unwrap();
                orchestrator
                    .submit_payment(session.id, PaymentSubmission::default())
                    .await
                    .unwrap()
            })
        });
    });
}

criterion_group!(benches, bench_state_machine, bench_guest_checkout);
criterion_main!(benches);
