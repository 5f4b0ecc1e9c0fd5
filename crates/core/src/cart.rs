//! Cart line items and the cart collection.
//!
//! # Invariants
//!
//! - Items are unique by `id` (adding the same product increases quantity)
//! - Insertion order is preserved
//! - Quantity never goes below zero; a decrement at zero is a no-op

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ProductId;

/// Errors returned by cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// No line in the cart has this product ID.
    #[error("Cart item not found: {0}")]
    ItemNotFound(ProductId),

    /// Adding the requested quantity would overflow the line quantity.
    #[error("Quantity overflow for cart item: {0}")]
    QuantityOverflow(ProductId),
}

/// An item in the shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product ID from the catalog.
    pub id: ProductId,
    /// Product name, sent with the order.
    pub name: String,
    /// Unit price in standard currency units.
    pub price: Decimal,
    /// Quantity in cart.
    pub quantity: u32,
}

impl CartItem {
    /// Create a new cart item.
    #[must_use]
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Decimal,
        quantity: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            quantity,
        }
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// A line of a submitted order: name and quantity only, price is not transmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub name: String,
    pub quantity: u32,
}

impl From<&CartItem> for OrderLine {
    fn from(item: &CartItem) -> Self {
        Self {
            name: item.name.clone(),
            quantity: item.quantity,
        }
    }
}

/// The shopping cart.
///
/// Serialized as a plain list of items. Deserializing merges repeated IDs the same
/// way [`Cart::add`] does.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Creates a new empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Adds an item, or increases the quantity of the existing line with the same ID.
    ///
    /// The name and price of an existing line are kept; only the quantity changes.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::QuantityOverflow`] if the combined quantity does not fit
    /// in a `u32`. The cart is unchanged in that case.
    pub fn add(&mut self, item: CartItem) -> Result<(), CartError> {
        if let Some(existing) = self.find_mut(&item.id) {
            existing.quantity = existing
                .quantity
                .checked_add(item.quantity)
                .ok_or_else(|| CartError::QuantityOverflow(item.id.clone()))?;
            return Ok(());
        }

        self.items.push(item);
        Ok(())
    }

    /// Increases the quantity of a line by one.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if no line has this ID, or
    /// [`CartError::QuantityOverflow`] at `u32::MAX`.
    pub fn increment(&mut self, id: &ProductId) -> Result<(), CartError> {
        let item = self
            .find_mut(id)
            .ok_or_else(|| CartError::ItemNotFound(id.clone()))?;
        item.quantity = item
            .quantity
            .checked_add(1)
            .ok_or_else(|| CartError::QuantityOverflow(id.clone()))?;
        Ok(())
    }

    /// Decreases the quantity of a line by one, stopping at zero.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if no line has this ID.
    pub fn decrement(&mut self, id: &ProductId) -> Result<(), CartError> {
        let item = self
            .find_mut(id)
            .ok_or_else(|| CartError::ItemNotFound(id.clone()))?;
        item.quantity = item.quantity.saturating_sub(1);
        Ok(())
    }

    /// Removes every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Sum of quantity times price over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Look up a line by product ID.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.id == id)
    }

    /// All lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Name and quantity of every line, for order creation.
    #[must_use]
    pub fn order_lines(&self) -> Vec<OrderLine> {
        self.items.iter().map(OrderLine::from).collect()
    }

    fn find_mut(&mut self, id: &ProductId) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|i| &i.id == id)
    }
}

impl TryFrom<Vec<CartItem>> for Cart {
    type Error = CartError;

    fn try_from(items: Vec<CartItem>) -> Result<Self, Self::Error> {
        let mut cart = Self::new();
        for item in items {
            cart.add(item)?;
        }
        Ok(cart)
    }
}

impl From<Cart> for Vec<CartItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}
