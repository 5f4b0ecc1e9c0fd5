//! Service seams for the catalog loader and checkout orchestrator.
//!
//! The HTTP clients in [`crate::content`] and [`crate::payment`] implement these;
//! tests substitute in-memory fakes.

use async_trait::async_trait;
use pupusas_core::Catalog;

use crate::content::{ContentError, CreatedOrder, OrderInput};
use crate::payment::{PaymentError, PaymentRequest, PaymentResponse};

/// Source of the product catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_catalog(&self) -> Result<Catalog, ContentError>;
}

/// Creates orders in the content service.
#[async_trait]
pub trait OrderService: Send + Sync {
    async fn create_order(&self, input: &OrderInput) -> Result<CreatedOrder, ContentError>;
}

/// Submits charges to the payment service.
///
/// A response with any HTTP status is `Ok`; only transport failures are `Err`.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn submit(&self, request: &PaymentRequest) -> Result<PaymentResponse, PaymentError>;
}
