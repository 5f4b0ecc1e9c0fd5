//! Product catalog as returned by the content service.
//!
//! The payload is stored verbatim; only the `products` field is interpreted.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Field of the catalog payload holding the product listing.
const PRODUCTS_FIELD: &str = "products";

/// Opaque catalog payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog(serde_json::Value);

impl Catalog {
    /// Wrap a raw response payload.
    #[must_use]
    pub const fn new(payload: serde_json::Value) -> Self {
        Self(payload)
    }

    /// The `products` field of the payload, if present.
    #[must_use]
    pub fn products(&self) -> Option<&serde_json::Value> {
        self.0.get(PRODUCTS_FIELD)
    }

    /// Number of entries in the `products` field, zero if it is missing or not a list.
    #[must_use]
    pub fn product_count(&self) -> usize {
        self.products()
            .and_then(serde_json::Value::as_array)
            .map_or(0, Vec::len)
    }

    /// Decode the `products` field into a typed listing.
    ///
    /// A missing field decodes as JSON `null`, so `Option<_>` targets succeed.
    ///
    /// # Errors
    ///
    /// Returns an error if the field does not match `T`.
    pub fn products_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let products = self
            .products()
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        serde_json::from_value(products)
    }

    /// The full payload.
    #[must_use]
    pub const fn payload(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<serde_json::Value> for Catalog {
    fn from(payload: serde_json::Value) -> Self {
        Self(payload)
    }
}
