//! Typed payloads for the content API order mutation.

use pupusas_core::{Customer, OrderId, OrderLine};
use serde::{Deserialize, Serialize};

use crate::checkout::CheckoutPayload;

/// `OrderCreateInput` sent with the `CreateOrder` mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    pub customer_name: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    /// Always sent as a string, whatever the shopper typed.
    pub postal_code: String,
    pub items: OrderItems,
}

/// Nested create list for the order's line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItems {
    pub create: Vec<OrderLine>,
}

impl OrderInput {
    /// Build the mutation input from checkout details and the cart's order lines.
    #[must_use]
    pub fn new(payload: &CheckoutPayload, lines: Vec<OrderLine>) -> Self {
        Self {
            customer_name: payload.name.clone(),
            phone: payload.phone.clone(),
            line1: payload.address.line1.clone(),
            line2: payload.address.line2.clone(),
            postal_code: payload.address.postal_code.clone(),
            items: OrderItems { create: lines },
        }
    }
}

/// Order returned by the `CreateOrder` mutation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub id: OrderId,
    pub customer_name: String,
}

impl From<CreatedOrder> for Customer {
    fn from(order: CreatedOrder) -> Self {
        Self {
            name: order.customer_name,
            order: order.id,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::checkout::Address;
    use serde_json::json;

    fn payload() -> CheckoutPayload {
        CheckoutPayload {
            email: "ana@example.com".to_string(),
            name: "Ana".to_string(),
            phone: "555-0100".to_string(),
            address: Address {
                line1: "1 Main St".to_string(),
                line2: None,
                city: Some("Oakland".to_string()),
                state: Some("CA".to_string()),
                postal_code: "94607".to_string(),
                country: Some("US".to_string()),
            },
        }
    }

    #[test]
    fn test_order_input_wire_shape() {
        let input = OrderInput::new(
            &payload(),
            vec![OrderLine {
                name: "Revuelta".to_string(),
                quantity: 3,
            }],
        );

        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            json!({
                "customerName": "Ana",
                "phone": "555-0100",
                "line1": "1 Main St",
                "line2": null,
                "postalCode": "94607",
                "items": { "create": [{ "name": "Revuelta", "quantity": 3 }] }
            })
        );
    }

    #[test]
    fn test_customer_from_order() {
        let order = CreatedOrder {
            id: OrderId::new("ord_9"),
            customer_name: "Ana".to_string(),
        };
        assert_eq!(Customer::from(order), Customer::new("Ana", "ord_9"));
    }
}
