//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type for every storefront operation. Checkout
//! failures are captured to Sentry via [`report`] before they reach the caller.

use pupusas_core::CartError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::content::ContentError;
use crate::payment::PaymentError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Content API operation failed.
    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    /// Payment function could not be reached.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Cart mutation targeted a missing or overflowing line.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Payment function answered with a non-200 status.
    #[error("Payment declined with status {status}")]
    PaymentDeclined { status: u16 },

    /// Checkout was requested with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Another checkout is still running on this orchestrator.
    #[error("A checkout is already in progress")]
    CheckoutInProgress,
}

impl AppError {
    /// Whether this error came from a remote service rather than the caller.
    #[must_use]
    pub const fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Content(_) | Self::Payment(_) | Self::PaymentDeclined { .. }
        )
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Log an error and capture it to Sentry.
///
/// Caller mistakes (empty cart, concurrent checkout, bad item IDs) are logged at
/// `warn` and not captured.
pub fn report(error: &AppError) {
    if error.is_upstream() {
        let event_id = sentry::capture_error(error);
        tracing::error!(
            error = %error,
            sentry_event_id = %event_id,
            "Checkout error"
        );
    } else {
        tracing::warn!(error = %error, "Checkout rejected");
    }
}

/// Add a breadcrumb for cart actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of cart actions
/// leading up to a failed checkout.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "ck9f0a1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pupusas_core::ProductId;

    #[test]
    fn test_app_error_display() {
        let err = AppError::PaymentDeclined { status: 402 };
        assert_eq!(err.to_string(), "Payment declined with status 402");

        let err = AppError::Cart(CartError::ItemNotFound(ProductId::new("p1")));
        assert_eq!(err.to_string(), "Cart error: Cart item not found: p1");
    }

    #[test]
    fn test_upstream_classification() {
        assert!(AppError::PaymentDeclined { status: 500 }.is_upstream());
        assert!(AppError::Content(ContentError::MissingData).is_upstream());
        assert!(!AppError::EmptyCart.is_upstream());
        assert!(!AppError::CheckoutInProgress.is_upstream());
    }

    #[test]
    fn test_report_without_sentry_client() {
        // No Sentry client is bound in tests; capture must be a no-op.
        report(&AppError::PaymentDeclined { status: 402 });
        report(&AppError::EmptyCart);
        add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "p1")]));
    }
}
