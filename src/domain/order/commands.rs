use serde::Deserialize;

use super::errors::OrderError;
use super::value_objects::{Address, OrderItem, OrderStatus};

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================

/// Checkout request. Amount, status and order number are always derived
/// server-side, so they are not part of the payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub note: Option<String>,
    pub customer_name: String,
    pub phone_number: String,
    #[serde(default)]
    pub email: Option<String>,
    pub billing_address: Address,
    #[serde(default)]
    pub shipping_address: Option<Address>,
}

impl PlaceOrder {
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.items.is_empty() {
            return Err(OrderError::EmptyItems);
        }

        for item in &self.items {
            if item.qty <= 0 {
                return Err(OrderError::InvalidQuantity(item.qty));
            }
        }

        if self.customer_name.trim().is_empty() {
            return Err(OrderError::MissingField("customerName"));
        }
        if self.phone_number.trim().is_empty() {
            return Err(OrderError::MissingField("phoneNumber"));
        }
        if !self.billing_address.is_complete() {
            return Err(OrderError::MissingField("billingAddress"));
        }
        if let Some(shipping) = &self.shipping_address {
            if !shipping.is_complete() {
                return Err(OrderError::MissingField("shippingAddress"));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrderStatus {
    pub status: OrderStatus,
}

// ============================================================================
// Unit Tests
// ============================================================================
