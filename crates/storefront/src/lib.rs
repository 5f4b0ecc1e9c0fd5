//! Pupusas Storefront library.
//!
//! Loads the product catalog from the GraphQL content API and runs checkouts
//! against the payment function and the order mutation, keeping the shared
//! [`pupusas_core::CartStore`] in step.
//!
//! # Example
//!
//! ```rust,ignore
//! use pupusas_storefront::{Checkout, ContentClient, StoreHandle, StorefrontConfig, load_catalog};
//!
//! let config = StorefrontConfig::from_env()?;
//! let store = StoreHandle::new();
//!
//! load_catalog(&ContentClient::new(&config.content), &store).await?;
//!
//! store.add_to_cart(item)?;
//! let checkout = Checkout::from_config(&config, store.clone());
//! let customer = checkout.checkout(&payload).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod checkout;
pub mod config;
pub mod content;
pub mod error;
pub mod payment;
pub mod ports;
pub mod state;

pub use catalog::load_catalog;
pub use checkout::{Address, Checkout, CheckoutOptions, CheckoutPayload};
pub use config::StorefrontConfig;
pub use content::{ContentClient, ContentError};
pub use error::{AppError, Result};
pub use payment::{PaymentClient, PaymentError, PaymentRequest, PaymentResponse};
pub use ports::{CatalogSource, OrderService, PaymentGateway};
pub use state::{CheckoutId, StoreHandle};
