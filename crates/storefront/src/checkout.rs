//! Checkout orchestration.
//!
//! # Flow
//!
//! ```text
//!  idle ──checkout()──► loading ──payment 200──► success ──order created──► success
//!                          │                        │                         │
//!                          │                        └──order fails──► failure │
//!                          │                                                  │
//!                          ├──payment non-200──► failure ──(delay)──► idle    │
//!                          │                                                  │
//!                          └──transport error──► failure          (delay) ◄───┘
//!                                                                    │
//!                                                         clear cart, idle
//! ```
//!
//! A declined payment stops the flow; no order is created for it.
//!
//! Checkouts on one store are serialized, however many orchestrators share it: a
//! call made while another is running is rejected with
//! [`AppError::CheckoutInProgress`]. The delayed transitions run as tokio tasks
//! tied to the checkout that scheduled them; a new checkout aborts the pending
//! task, and a task that lost the race to a newer checkout leaves the store alone.

use std::sync::Arc;
use std::time::Duration;

use pupusas_core::{Customer, UiStatus};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::StorefrontConfig;
use crate::content::{ContentClient, OrderInput};
use crate::error::{AppError, Result, report};
use crate::payment::{PaymentClient, PaymentRequest};
use crate::ports::{OrderService, PaymentGateway};
use crate::state::{CheckoutId, DeferredTransition, StoreHandle};

/// Contact and shipping details entered at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutPayload {
    pub email: String,
    pub name: String,
    pub phone: String,
    pub address: Address,
}

/// Shipping address in the payment provider's field layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Address forms may submit this as a number.
    #[serde(deserialize_with = "string_or_number")]
    pub postal_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

/// Settings the orchestrator needs from the configuration.
#[derive(Debug, Clone)]
pub struct CheckoutOptions {
    /// Card token sent with every charge.
    pub card_token: SecretString,
    /// Delay before success/failure returns to idle.
    pub reset_delay: Duration,
}

impl From<&StorefrontConfig> for CheckoutOptions {
    fn from(config: &StorefrontConfig) -> Self {
        Self {
            card_token: config.payment.card_token.clone(),
            reset_delay: config.reset_delay,
        }
    }
}

// =============================================================================
// Checkout
// =============================================================================

/// Sequences payment and order creation against a shared store.
///
/// Cheaply cloneable. Checkout bookkeeping lives on the [`StoreHandle`], so
/// separate orchestrators over one store still run one checkout at a time.
#[derive(Clone)]
pub struct Checkout {
    inner: Arc<CheckoutInner>,
}

struct CheckoutInner {
    store: StoreHandle,
    payment: Arc<dyn PaymentGateway>,
    orders: Arc<dyn OrderService>,
    options: CheckoutOptions,
}

impl Checkout {
    /// Create an orchestrator over explicit services.
    #[must_use]
    pub fn new(
        store: StoreHandle,
        payment: Arc<dyn PaymentGateway>,
        orders: Arc<dyn OrderService>,
        options: CheckoutOptions,
    ) -> Self {
        Self {
            inner: Arc::new(CheckoutInner {
                store,
                payment,
                orders,
                options,
            }),
        }
    }

    /// Create an orchestrator talking to the configured HTTP services.
    #[must_use]
    pub fn from_config(config: &StorefrontConfig, store: StoreHandle) -> Self {
        Self::new(
            store,
            Arc::new(PaymentClient::new(&config.payment)),
            Arc::new(ContentClient::new(&config.content)),
            CheckoutOptions::from(config),
        )
    }

    /// The store this orchestrator drives.
    #[must_use]
    pub fn store(&self) -> &StoreHandle {
        &self.inner.store
    }

    /// Charge the cart and create the order.
    ///
    /// Returns the customer recorded for the created order.
    ///
    /// # Errors
    ///
    /// - [`AppError::CheckoutInProgress`] if another checkout on the store is running
    /// - [`AppError::EmptyCart`] if there is nothing to charge
    /// - [`AppError::Payment`] if the payment function could not be reached or the
    ///   charge could not be built
    /// - [`AppError::PaymentDeclined`] if the payment function answered non-200
    /// - [`AppError::Content`] if order creation failed
    ///
    /// Except for the first two, the status is left at failure.
    #[instrument(skip(self, payload), fields(customer = %payload.name))]
    pub async fn checkout(&self, payload: &CheckoutPayload) -> Result<Customer> {
        let result = self.run(payload).await;
        if let Err(e) = &result {
            report(e);
        }
        result
    }

    async fn run(&self, payload: &CheckoutPayload) -> Result<Customer> {
        let store = &self.inner.store;
        let ticket = store.begin_checkout()?;
        let id = ticket.id;

        let request =
            match PaymentRequest::new(payload, ticket.cart.total(), &self.inner.options.card_token) {
                Ok(request) => request,
                Err(e) => {
                    store.update_for(id, UiStatus::Failure);
                    return Err(e.into());
                }
            };
        let order = OrderInput::new(payload, ticket.cart.order_lines());

        info!(
            checkout = %id,
            amount = request.amount,
            idempotency_key = %request.idempotency_key,
            "Submitting payment"
        );

        let response = match self.inner.payment.submit(&request).await {
            Ok(response) => response,
            Err(e) => {
                store.update_for(id, UiStatus::Failure);
                return Err(e.into());
            }
        };

        if !response.is_approved() {
            warn!(checkout = %id, status = response.status, "Payment declined");
            store.update_for(id, UiStatus::Failure);
            self.schedule(id, DeferredTransition::ResetStatus);
            return Err(AppError::PaymentDeclined {
                status: response.status,
            });
        }

        store.update_for(id, UiStatus::Success);
        self.schedule(id, DeferredTransition::ClearCart);

        let created = match self.inner.orders.create_order(&order).await {
            Ok(created) => created,
            Err(e) => {
                store.update_for(id, UiStatus::Failure);
                return Err(e.into());
            }
        };

        let customer = Customer::from(created);
        store.complete_for(id, customer.clone());
        info!(checkout = %id, order = %customer.order, "Order created");

        Ok(customer)
    }

    /// Run `transition` for checkout `id` after the reset delay.
    fn schedule(&self, id: CheckoutId, transition: DeferredTransition) {
        let store = self.inner.store.clone();
        let delay = self.inner.options.reset_delay;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if store.apply_deferred(id, transition) {
                debug!(checkout = %id, ?transition, "Deferred transition applied");
            }
        });

        self.inner.store.set_pending(handle);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_accepts_numeric_postal_code() {
        let payload: CheckoutPayload = serde_json::from_value(json!({
            "email": "ana@example.com",
            "name": "Ana",
            "phone": "555-0100",
            "address": { "line1": "1 Main St", "postal_code": 94607 }
        }))
        .unwrap();

        assert_eq!(payload.address.postal_code, "94607");
        assert_eq!(payload.address.line2, None);
    }

    #[test]
    fn test_address_serializes_provider_layout() {
        let address = Address {
            line1: "1 Main St".to_string(),
            line2: None,
            city: Some("Oakland".to_string()),
            state: None,
            postal_code: "94607".to_string(),
            country: None,
        };

        assert_eq!(
            serde_json::to_value(&address).unwrap(),
            json!({
                "line1": "1 Main St",
                "line2": null,
                "city": "Oakland",
                "postal_code": "94607"
            })
        );
    }

    #[test]
    fn test_options_from_config() {
        let config = StorefrontConfig {
            reset_delay: Duration::from_millis(10),
            ..StorefrontConfig::default()
        };
        let options = CheckoutOptions::from(&config);
        assert_eq!(options.reset_delay, Duration::from_millis(10));
    }
}
