use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::product::ProductId;

// ============================================================================
// Order Value Objects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub Uuid);

impl OrderId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Human-facing order number, e.g. "0001".
///
/// Only a display format of the durable counter value; values past 9999
/// simply grow wider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    pub fn from_sequence(value: i64) -> Self {
        Self(format!("{value:04}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for OrderNumber {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product: ProductId,
    pub qty: i32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl Address {
    pub(crate) fn is_complete(&self) -> bool {
        [&self.street, &self.city, &self.state, &self.postal_code]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    fn rank(&self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Processing => 1,
            OrderStatus::Completed => 2,
            OrderStatus::Cancelled => 3,
        }
    }

    /// Forward moves only; cancellation from any non-terminal state.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            OrderStatus::Cancelled => true,
            _ => next.rank() > self.rank(),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "PROCESSING" => Ok(OrderStatus::Processing),
            "COMPLETED" => Ok(OrderStatus::Completed),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_number_is_zero_padded() {
        assert_eq!(OrderNumber::from_sequence(1).as_str(), "0001");
        assert_eq!(OrderNumber::from_sequence(42).as_str(), "0042");
        assert_eq!(OrderNumber::from_sequence(9999).as_str(), "9999");
        assert_eq!(OrderNumber::from_sequence(10000).as_str(), "10000");
    }

    #[test]
    fn test_order_item_wire_format() {
        let product = ProductId::new();
        let item: OrderItem =
            serde_json::from_str(&format!(r#"{{"product":"{}","qty":3}}"#, product)).unwrap();

        assert_eq!(item.product, product);
        assert_eq!(item.qty, 3);
    }

    #[test]
    fn test_order_status_wire_format() {
        assert_eq!(serde_json::to_string(&OrderStatus::Cancelled).unwrap(), "\"CANCELLED\"");
        assert_eq!("PROCESSING".parse::<OrderStatus>().unwrap(), OrderStatus::Processing);
        assert!("SHIPPED".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_forward_transitions_are_allowed() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Completed));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Completed));
    }

    #[test]
    fn test_cancellation_from_non_terminal_states() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_terminal_and_backward_transitions_are_rejected() {
        assert!(!OrderStatus::Processing.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Processing));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Completed));
    }

    #[test]
    fn test_address_completeness() {
        let mut address = Address {
            street: "1 Kiln Lane".to_string(),
            city: "Kandy".to_string(),
            state: "Central".to_string(),
            postal_code: "20000".to_string(),
        };
        assert!(address.is_complete());

        address.postal_code = " ".to_string();
        assert!(!address.is_complete());
    }
}
