//! # Cart Store
//!
//! The owned state object behind the cart UI: line items, the last customer,
//! the checkout status and the loaded catalog.
//!
//! ```text
//!  UI action             CartStore method         State change
//!  ─────────             ────────────────         ────────────
//!  Add product ────────► add_to_cart() ─────────► cart.add(item)
//!  + / - buttons ──────► increment/decrement() ─► quantity ± 1 (min 0)
//!  Empty cart ─────────► clear_cart() ──────────► cart = [], status = idle
//!  Checkout progress ──► update_cart_ui() ──────► status = <any>
//!  Order created ──────► set_customer() ────────► customer = Some(..)
//!  App start ──────────► set_products() ────────► catalog = Some(..)
//! ```
//!
//! Every method is synchronous and infallible except for lookups by product ID.
//! Callers that share the store across tasks wrap it in a lock.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartError, CartItem, OrderLine};
use crate::catalog::Catalog;
use crate::customer::Customer;
use crate::types::{ProductId, UiStatus};

/// Cart, customer, checkout status and catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartStore {
    #[serde(rename = "cartUIStatus")]
    status: UiStatus,
    #[serde(rename = "storedata")]
    catalog: Option<Catalog>,
    cart: Cart,
    customer: Option<Customer>,
}

impl CartStore {
    /// Creates an empty store: no items, no customer, no catalog, status idle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds an item, merging quantities with an existing line of the same ID.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::QuantityOverflow`] if the merged quantity overflows.
    pub fn add_to_cart(&mut self, item: CartItem) -> Result<(), CartError> {
        self.cart.add(item)
    }

    /// Increases the quantity of a line by one.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if no line has this ID.
    pub fn increment_quantity(&mut self, id: &ProductId) -> Result<(), CartError> {
        self.cart.increment(id)
    }

    /// Decreases the quantity of a line by one, never below zero.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if no line has this ID.
    pub fn decrement_quantity(&mut self, id: &ProductId) -> Result<(), CartError> {
        self.cart.decrement(id)
    }

    /// Empties the cart and resets the status to idle.
    pub fn clear_cart(&mut self) {
        self.cart.clear();
        self.status = UiStatus::Idle;
    }

    /// Replaces the customer record.
    pub fn set_customer(&mut self, customer: Customer) {
        self.customer = Some(customer);
    }

    /// Replaces the catalog.
    pub fn set_products(&mut self, catalog: Catalog) {
        self.catalog = Some(catalog);
    }

    /// Sets the checkout status. Any status may follow any other.
    pub const fn update_cart_ui(&mut self, status: UiStatus) {
        self.status = status;
    }

    // =========================================================================
    // Derived reads
    // =========================================================================

    /// Sum of quantities over all lines; zero for an empty cart.
    #[must_use]
    pub fn cart_count(&self) -> u64 {
        self.cart.count()
    }

    /// Sum of quantity times price over all lines; zero for an empty cart.
    #[must_use]
    pub fn cart_total(&self) -> Decimal {
        self.cart.total()
    }

    /// The `products` field of the loaded catalog.
    #[must_use]
    pub fn featured_products(&self) -> Option<&serde_json::Value> {
        self.catalog.as_ref().and_then(Catalog::products)
    }

    /// Name and quantity of every line, for order creation.
    #[must_use]
    pub fn order_lines(&self) -> Vec<OrderLine> {
        self.cart.order_lines()
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub const fn status(&self) -> UiStatus {
        self.status
    }

    #[must_use]
    pub const fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    #[must_use]
    pub const fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_ref()
    }
}
