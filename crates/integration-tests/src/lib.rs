//! Integration tests for the Pupusas storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pupusas-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_store` - Cart store properties through the shared handle
//! - `checkout_flow` - Checkout state machine against in-memory services
//! - `catalog_load` - Startup catalog load
//!
//! The fakes in this crate stand in for the content API and the payment
//! function. They record every request so tests can assert on what was sent.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use pupusas_core::{CartItem, Catalog, OrderId};
use pupusas_storefront::content::{CreatedOrder, GraphQLError, OrderInput};
use pupusas_storefront::{
    Address, CatalogSource, Checkout, CheckoutOptions, CheckoutPayload, ContentError,
    OrderService, PaymentError, PaymentGateway, PaymentRequest, PaymentResponse, StoreHandle,
};
use rust_decimal::Decimal;
use secrecy::SecretString;
use tokio::sync::Notify;

/// Reset delay used by every test harness.
pub const RESET_DELAY: Duration = Duration::from_secs(5);

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Payment
// =============================================================================

/// Payment function fake answering with scripted statuses.
///
/// Statuses are consumed in order; once the script runs out the last status
/// repeats.
pub struct FakePayment {
    statuses: Mutex<VecDeque<u16>>,
    last: Mutex<u16>,
    requests: Mutex<Vec<PaymentRequest>>,
    gate: Option<Arc<Notify>>,
}

impl FakePayment {
    /// Answer every request with `status`.
    #[must_use]
    pub fn answering(status: u16) -> Self {
        Self::scripted(&[status])
    }

    /// Answer requests with `statuses` in order.
    #[must_use]
    pub fn scripted(statuses: &[u16]) -> Self {
        Self {
            statuses: Mutex::new(statuses.iter().copied().collect()),
            last: Mutex::new(statuses.last().copied().unwrap_or(200)),
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Hold every request until `gate` is notified.
    #[must_use]
    pub fn held_by(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<PaymentRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl PaymentGateway for FakePayment {
    async fn submit(&self, request: &PaymentRequest) -> Result<PaymentResponse, PaymentError> {
        lock(&self.requests).push(request.clone());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let status = {
            let next = lock(&self.statuses).pop_front();
            let mut last = lock(&self.last);
            if let Some(status) = next {
                *last = status;
            }
            *last
        };
        Ok(PaymentResponse { status })
    }
}

// =============================================================================
// Content
// =============================================================================

/// Content API fake creating sequentially numbered orders.
#[derive(Default)]
pub struct FakeOrders {
    created: Mutex<Vec<OrderInput>>,
    next: AtomicUsize,
    fail_with: Mutex<Option<String>>,
}

impl FakeOrders {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every order with a GraphQL error carrying `message`.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        let orders = Self::default();
        *lock(&orders.fail_with) = Some(message.to_string());
        orders
    }

    /// Order inputs received so far.
    #[must_use]
    pub fn created(&self) -> Vec<OrderInput> {
        lock(&self.created).clone()
    }
}

#[async_trait]
impl OrderService for FakeOrders {
    async fn create_order(&self, input: &OrderInput) -> Result<CreatedOrder, ContentError> {
        if let Some(message) = lock(&self.fail_with).clone() {
            return Err(ContentError::GraphQL(vec![GraphQLError {
                message,
                locations: vec![],
                path: vec![serde_json::Value::String("createOrder".to_string())],
            }]));
        }

        lock(&self.created).push(input.clone());
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(CreatedOrder {
            id: OrderId::new(format!("order-{n}")),
            customer_name: input.customer_name.clone(),
        })
    }
}

/// Catalog source returning a fixed payload, or failing when empty.
pub struct FakeCatalog(pub Option<serde_json::Value>);

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn fetch_catalog(&self) -> Result<Catalog, ContentError> {
        self.0
            .clone()
            .map(Catalog::new)
            .ok_or(ContentError::MissingData)
    }
}

// =============================================================================
// Harness
// =============================================================================

/// A store and orchestrator wired to fakes.
pub struct Harness {
    pub store: StoreHandle,
    pub checkout: Checkout,
    pub payment: Arc<FakePayment>,
    pub orders: Arc<FakeOrders>,
}

impl Harness {
    #[must_use]
    pub fn new(payment: FakePayment, orders: FakeOrders) -> Self {
        let store = StoreHandle::new();
        let payment = Arc::new(payment);
        let orders = Arc::new(orders);
        let checkout = Checkout::new(store.clone(), payment.clone(), orders.clone(), options());
        Self {
            store,
            checkout,
            payment,
            orders,
        }
    }

    /// A second orchestrator over the same store and order service, with its
    /// own payment fake.
    #[must_use]
    pub fn sibling(&self, payment: FakePayment) -> (Checkout, Arc<FakePayment>) {
        let payment = Arc::new(payment);
        let checkout = Checkout::new(
            self.store.clone(),
            payment.clone(),
            self.orders.clone(),
            options(),
        );
        (checkout, payment)
    }
}

/// Orchestrator options used by every test harness.
#[must_use]
pub fn options() -> CheckoutOptions {
    CheckoutOptions {
        card_token: SecretString::from("tok_visa"),
        reset_delay: RESET_DELAY,
    }
}

/// Yield until `payment` has received `count` requests.
pub async fn until_charged(payment: &FakePayment, count: usize) {
    while payment.requests().len() < count {
        tokio::task::yield_now().await;
    }
}

/// Checkout details for a test shopper.
#[must_use]
pub fn shopper() -> CheckoutPayload {
    CheckoutPayload {
        email: "ana@example.com".to_string(),
        name: "Ana Martinez".to_string(),
        phone: "555-0100".to_string(),
        address: Address {
            line1: "1 Main St".to_string(),
            line2: Some("Apt 2".to_string()),
            city: Some("Oakland".to_string()),
            state: Some("CA".to_string()),
            postal_code: "94607".to_string(),
            country: Some("US".to_string()),
        },
    }
}

/// A cart item priced in whole dollars.
#[must_use]
pub fn item(id: &str, name: &str, dollars: i64, quantity: u32) -> CartItem {
    CartItem::new(id, name, Decimal::new(dollars, 0), quantity)
}

/// Let time pass on a paused clock and give spawned tasks a chance to run.
pub async fn advance(by: Duration) {
    tokio::time::sleep(by).await;
    tokio::task::yield_now().await;
}
