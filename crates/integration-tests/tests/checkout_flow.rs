//! Integration tests for the checkout state machine.
//!
//! Payment and order creation run against in-memory fakes. Timer-driven
//! transitions use a paused tokio clock.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use pupusas_core::{OrderLine, UiStatus};
use pupusas_integration_tests::{
    FakeOrders, FakePayment, Harness, RESET_DELAY, advance, item, options, shopper,
    until_charged,
};
use pupusas_storefront::config::PaymentConfig;
use pupusas_storefront::{
    AppError, Checkout, ContentError, PaymentClient, PaymentError, StoreHandle,
};
use rust_decimal::Decimal;
use secrecy::SecretString;
use tokio::sync::Notify;

const JUST_BEFORE: Duration = Duration::from_millis(4_900);
const JUST_AFTER: Duration = Duration::from_millis(5_100);

// =============================================================================
// Approved Payment
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_approved_checkout_creates_order_then_clears_cart() {
    let h = Harness::new(FakePayment::answering(200), FakeOrders::new());
    h.store.add_to_cart(item("p1", "Revuelta", 3, 2)).unwrap();

    let customer = h.checkout.checkout(&shopper()).await.unwrap();

    assert_eq!(customer.name, "Ana Martinez");
    assert_eq!(customer.order.as_str(), "order-1");
    assert_eq!(h.store.status(), UiStatus::Success);
    assert_eq!(h.store.customer(), Some(customer));
    assert_eq!(h.store.cart_count(), 2);

    advance(JUST_BEFORE).await;
    assert_eq!(h.store.status(), UiStatus::Success);
    assert_eq!(h.store.cart_count(), 2);

    advance(JUST_AFTER - JUST_BEFORE).await;
    assert_eq!(h.store.status(), UiStatus::Idle);
    assert_eq!(h.store.cart_count(), 0);
    assert!(h.store.customer().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_amount_is_floored_to_cents() {
    let h = Harness::new(FakePayment::answering(200), FakeOrders::new());
    h.store
        .add_to_cart(pupusas_core::CartItem::new(
            "p1",
            "Loroco",
            Decimal::new(3335, 3),
            3,
        ))
        .unwrap();

    h.checkout.checkout(&shopper()).await.unwrap();

    let requests = h.payment.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].amount, 1000);
    assert_eq!(requests[0].token, "tok_visa");
    assert_eq!(requests[0].email, "ana@example.com");
}

#[tokio::test(start_paused = true)]
async fn test_order_carries_names_and_quantities() {
    let h = Harness::new(FakePayment::answering(200), FakeOrders::new());
    h.store.add_to_cart(item("p1", "Revuelta", 3, 2)).unwrap();
    h.store.add_to_cart(item("p2", "Queso", 4, 1)).unwrap();
    h.store.add_to_cart(item("p1", "Revuelta", 3, 1)).unwrap();

    h.checkout.checkout(&shopper()).await.unwrap();

    let created = h.orders.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].customer_name, "Ana Martinez");
    assert_eq!(created[0].postal_code, "94607");
    assert_eq!(
        created[0].items.create,
        vec![
            OrderLine {
                name: "Revuelta".to_string(),
                quantity: 3,
            },
            OrderLine {
                name: "Queso".to_string(),
                quantity: 1,
            },
        ]
    );
    assert_eq!(h.payment.requests()[0].amount, 1300);
}

#[tokio::test(start_paused = true)]
async fn test_each_attempt_gets_fresh_idempotency_key() {
    let h = Harness::new(FakePayment::scripted(&[402, 200]), FakeOrders::new());
    h.store.add_to_cart(item("p1", "Revuelta", 3, 1)).unwrap();

    let _ = h.checkout.checkout(&shopper()).await;
    h.checkout.checkout(&shopper()).await.unwrap();

    let requests = h.payment.requests();
    assert_eq!(requests.len(), 2);
    assert_ne!(requests[0].idempotency_key, requests[1].idempotency_key);
}

// =============================================================================
// Declined Payment
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_declined_payment_keeps_cart_and_resets_status() {
    let h = Harness::new(FakePayment::answering(402), FakeOrders::new());
    h.store.add_to_cart(item("p1", "Revuelta", 3, 2)).unwrap();

    let err = h.checkout.checkout(&shopper()).await.unwrap_err();

    assert!(matches!(err, AppError::PaymentDeclined { status: 402 }));
    assert_eq!(h.store.status(), UiStatus::Failure);
    assert!(h.orders.created().is_empty());
    assert_eq!(h.store.customer(), None);

    advance(JUST_AFTER).await;
    assert_eq!(h.store.status(), UiStatus::Idle);
    assert_eq!(h.store.cart_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_non_200_success_codes_are_declines() {
    let h = Harness::new(FakePayment::answering(201), FakeOrders::new());
    h.store.add_to_cart(item("p1", "Revuelta", 3, 1)).unwrap();

    let err = h.checkout.checkout(&shopper()).await.unwrap_err();

    assert!(matches!(err, AppError::PaymentDeclined { status: 201 }));
    assert!(h.orders.created().is_empty());
}

// =============================================================================
// Order Failure
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_order_failure_after_payment_still_clears_cart() {
    let h = Harness::new(
        FakePayment::answering(200),
        FakeOrders::failing("Field postalCode is invalid"),
    );
    h.store.add_to_cart(item("p1", "Revuelta", 3, 2)).unwrap();

    let err = h.checkout.checkout(&shopper()).await.unwrap_err();

    match err {
        AppError::Content(ContentError::GraphQL(errors)) => {
            assert_eq!(errors[0].message, "Field postalCode is invalid");
        }
        other => panic!("expected GraphQL error, got {other:?}"),
    }
    assert_eq!(h.store.status(), UiStatus::Failure);
    assert_eq!(h.store.customer(), None);

    advance(JUST_AFTER).await;
    assert_eq!(h.store.status(), UiStatus::Idle);
    assert_eq!(h.store.cart_count(), 0);
}

// =============================================================================
// Rejected Checkouts
// =============================================================================

#[tokio::test]
async fn test_empty_cart_is_rejected() {
    let h = Harness::new(FakePayment::answering(200), FakeOrders::new());

    let err = h.checkout.checkout(&shopper()).await.unwrap_err();

    assert!(matches!(err, AppError::EmptyCart));
    assert_eq!(h.store.status(), UiStatus::Idle);
    assert!(h.payment.requests().is_empty());
}

#[tokio::test]
async fn test_concurrent_checkout_is_rejected() {
    let gate = Arc::new(Notify::new());
    let h = Harness::new(
        FakePayment::answering(200).held_by(Arc::clone(&gate)),
        FakeOrders::new(),
    );
    h.store.add_to_cart(item("p1", "Revuelta", 3, 1)).unwrap();

    let first = {
        let checkout = h.checkout.clone();
        tokio::spawn(async move { checkout.checkout(&shopper()).await })
    };
    until_charged(&h.payment, 1).await;
    assert_eq!(h.store.status(), UiStatus::Loading);

    let err = h.checkout.checkout(&shopper()).await.unwrap_err();
    assert!(matches!(err, AppError::CheckoutInProgress));
    assert_eq!(h.store.status(), UiStatus::Loading);

    gate.notify_one();
    let customer = first.await.unwrap().unwrap();

    assert_eq!(customer.order.as_str(), "order-1");
    assert_eq!(h.store.status(), UiStatus::Success);
    assert_eq!(h.payment.requests().len(), 1);
}

// =============================================================================
// Superseded Transitions
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_new_checkout_cancels_pending_reset() {
    let h = Harness::new(FakePayment::scripted(&[402, 200]), FakeOrders::new());
    h.store.add_to_cart(item("p1", "Revuelta", 3, 2)).unwrap();

    // Declined at t=0 schedules a reset for t=5.
    let err = h.checkout.checkout(&shopper()).await.unwrap_err();
    assert!(matches!(err, AppError::PaymentDeclined { status: 402 }));

    advance(Duration::from_secs(1)).await;
    h.checkout.checkout(&shopper()).await.unwrap();
    assert_eq!(h.store.status(), UiStatus::Success);

    // The first reset would have fired here.
    advance(Duration::from_millis(4_500)).await;
    assert_eq!(h.store.status(), UiStatus::Success);
    assert_eq!(h.store.cart_count(), 2);

    advance(Duration::from_secs(1)).await;
    assert_eq!(h.store.status(), UiStatus::Idle);
    assert_eq!(h.store.cart_count(), 0);
    assert_eq!(h.store.active_checkout(), None);
}

#[tokio::test(start_paused = true)]
async fn test_new_checkout_cancels_pending_cart_clear() {
    let h = Harness::new(FakePayment::scripted(&[200, 402]), FakeOrders::new());
    h.store.add_to_cart(item("p1", "Revuelta", 3, 2)).unwrap();

    // Approved at t=0 schedules a cart clear for t=5.
    h.checkout.checkout(&shopper()).await.unwrap();

    advance(Duration::from_secs(1)).await;
    h.store.add_to_cart(item("p2", "Queso", 4, 1)).unwrap();
    let err = h.checkout.checkout(&shopper()).await.unwrap_err();
    assert!(matches!(err, AppError::PaymentDeclined { status: 402 }));

    advance(Duration::from_millis(4_500)).await;
    assert_eq!(h.store.status(), UiStatus::Failure);
    assert_eq!(h.store.cart_count(), 3);

    advance(Duration::from_secs(1)).await;
    assert_eq!(h.store.status(), UiStatus::Idle);
    assert_eq!(h.store.cart_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_cart_changes_during_success_window_are_cleared() {
    let h = Harness::new(FakePayment::answering(200), FakeOrders::new());
    h.store.add_to_cart(item("p1", "Revuelta", 3, 1)).unwrap();

    h.checkout.checkout(&shopper()).await.unwrap();
    h.store.add_to_cart(item("p2", "Queso", 4, 1)).unwrap();

    advance(RESET_DELAY + Duration::from_millis(1)).await;
    assert!(h.store.cart().is_empty());
}

// =============================================================================
// Orchestrators Sharing a Store
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_other_orchestrator_timer_leaves_running_checkout_alone() {
    let h = Harness::new(FakePayment::answering(200), FakeOrders::new());
    let gate = Arc::new(Notify::new());
    let (other, other_payment) =
        h.sibling(FakePayment::answering(200).held_by(Arc::clone(&gate)));
    h.store.add_to_cart(item("p1", "Revuelta", 3, 1)).unwrap();

    // The first orchestrator finishes at t=0 and schedules a clear for t=5.
    h.checkout.checkout(&shopper()).await.unwrap();
    let first = h.store.active_checkout().unwrap();

    advance(Duration::from_secs(1)).await;
    let running = tokio::spawn(async move { other.checkout(&shopper()).await });
    until_charged(&other_payment, 1).await;
    assert_ne!(h.store.active_checkout(), Some(first));

    advance(Duration::from_millis(4_500)).await;
    assert_eq!(h.store.status(), UiStatus::Loading);
    assert_eq!(h.store.cart_count(), 1);

    gate.notify_one();
    let customer = running.await.unwrap().unwrap();
    assert_eq!(customer.order.as_str(), "order-2");
    assert_eq!(h.store.status(), UiStatus::Success);

    advance(JUST_AFTER).await;
    assert_eq!(h.store.status(), UiStatus::Idle);
    assert_eq!(h.store.cart_count(), 0);
}

#[tokio::test]
async fn test_orchestrators_sharing_a_store_never_charge_concurrently() {
    let gate = Arc::new(Notify::new());
    let h = Harness::new(
        FakePayment::answering(200).held_by(Arc::clone(&gate)),
        FakeOrders::new(),
    );
    let (other, other_payment) = h.sibling(FakePayment::answering(200));
    h.store.add_to_cart(item("p1", "Revuelta", 3, 1)).unwrap();

    let first = {
        let checkout = h.checkout.clone();
        tokio::spawn(async move { checkout.checkout(&shopper()).await })
    };
    until_charged(&h.payment, 1).await;

    let err = other.checkout(&shopper()).await.unwrap_err();
    assert!(matches!(err, AppError::CheckoutInProgress));
    assert!(other_payment.requests().is_empty());
    assert_eq!(h.store.status(), UiStatus::Loading);

    gate.notify_one();
    first.await.unwrap().unwrap();
    assert_eq!(h.orders.created().len(), 1);
}

// =============================================================================
// Transport Failure
// =============================================================================

#[tokio::test]
async fn test_unreachable_payment_function_fails_checkout() {
    let store = StoreHandle::new();
    let orders = Arc::new(FakeOrders::new());
    let payment = PaymentClient::new(&PaymentConfig {
        endpoint: "http://127.0.0.1:1/charge".to_string(),
        card_token: SecretString::from("tok_visa"),
    });
    let checkout = Checkout::new(
        store.clone(),
        Arc::new(payment),
        orders.clone(),
        options(),
    );
    store.add_to_cart(item("p1", "Revuelta", 3, 1)).unwrap();

    let err = checkout.checkout(&shopper()).await.unwrap_err();

    assert!(matches!(err, AppError::Payment(PaymentError::Http(_))));
    assert_eq!(store.status(), UiStatus::Failure);
    assert_eq!(store.cart_count(), 1);
    assert!(orders.created().is_empty());
}
