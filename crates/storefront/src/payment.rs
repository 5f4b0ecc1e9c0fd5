//! Payment function client.
//!
//! The payment function charges the card and answers with a plain HTTP status:
//! 200 means the charge went through, anything else is a decline. Only transport
//! failures are errors here; interpreting the status is the caller's job.

use async_trait::async_trait;
use pupusas_core::to_minor_units;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::checkout::{Address, CheckoutPayload};
use crate::config::PaymentConfig;
use crate::ports::PaymentGateway;

/// Errors that can occur when calling the payment function.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request could not be built.
    #[error("Invalid payment request: {0}")]
    InvalidRequest(String),
}

/// Charge request sent to the payment function.
///
/// Field names on the wire match the deployed function. `Debug` redacts the
/// card token.
#[derive(Clone, Serialize)]
pub struct PaymentRequest {
    #[serde(rename = "stripeEmail")]
    pub email: String,
    #[serde(rename = "stripeName")]
    pub name: String,
    #[serde(rename = "stripePhone")]
    pub phone: String,
    #[serde(rename = "stripeAddress")]
    pub address: Address,
    /// Amount in minor units (cents).
    #[serde(rename = "stripeAmt")]
    pub amount: i64,
    #[serde(rename = "stripeToken")]
    pub token: String,
    #[serde(rename = "stripeIdempotency")]
    pub idempotency_key: Uuid,
}

impl std::fmt::Debug for PaymentRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentRequest")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("phone", &self.phone)
            .field("address", &self.address)
            .field("amount", &self.amount)
            .field("token", &"[REDACTED]")
            .field("idempotency_key", &self.idempotency_key)
            .finish()
    }
}

impl PaymentRequest {
    /// Build a charge for `total` with a fresh idempotency key.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::InvalidRequest`] if the total is negative or does not
    /// fit in minor units.
    pub fn new(
        payload: &CheckoutPayload,
        total: Decimal,
        card_token: &SecretString,
    ) -> Result<Self, PaymentError> {
        if total < Decimal::ZERO {
            return Err(PaymentError::InvalidRequest(format!(
                "negative amount {total}"
            )));
        }
        let amount = to_minor_units(total).ok_or_else(|| {
            PaymentError::InvalidRequest(format!("amount {total} out of range"))
        })?;

        Ok(Self {
            email: payload.email.clone(),
            name: payload.name.clone(),
            phone: payload.phone.clone(),
            address: payload.address.clone(),
            amount,
            token: card_token.expose_secret().to_string(),
            idempotency_key: Uuid::new_v4(),
        })
    }
}

/// Outcome of a payment call that reached the function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentResponse {
    pub status: u16,
}

impl PaymentResponse {
    /// Whether the charge went through. Only an exact 200 counts.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        self.status == 200
    }
}

/// Client for the payment function.
#[derive(Clone)]
pub struct PaymentClient {
    client: reqwest::Client,
    endpoint: String,
}

impl PaymentClient {
    /// Create a new payment client.
    #[must_use]
    pub fn new(config: &PaymentConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
        }
    }
}

#[async_trait]
impl PaymentGateway for PaymentClient {
    #[instrument(skip(self, request), fields(amount = request.amount, idempotency_key = %request.idempotency_key))]
    async fn submit(&self, request: &PaymentRequest) -> Result<PaymentResponse, PaymentError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await?;

        let status = response.status().as_u16();
        // The body is informational only; a failed read does not change the outcome
        let body = response.text().await.unwrap_or_default();
        debug!(status, body = %body.chars().take(500).collect::<String>(), "Payment function responded");

        Ok(PaymentResponse { status })
    }
}
