//! Customer record derived from a created order.

use serde::{Deserialize, Serialize};

use crate::types::OrderId;

/// The customer behind the most recent successful order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Customer {
    /// Name the order was placed under.
    pub name: String,
    /// ID of the order created for this customer.
    pub order: OrderId,
}

impl Customer {
    #[must_use]
    pub fn new(name: impl Into<String>, order: impl Into<OrderId>) -> Self {
        Self {
            name: name.into(),
            order: order.into(),
        }
    }
}
