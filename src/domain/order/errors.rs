use super::value_objects::{OrderId, OrderStatus};
use crate::storage::StoreError;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    /// Unknown product or not enough stock; the two are not distinguished.
    #[error("One or more items in your order are invalid or unavailable.")]
    Unprocessable,

    #[error("Order not found")]
    NotFound(OrderId),

    #[error("Cannot move order from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order items cannot be empty")]
    EmptyItems,

    #[error("Invalid item quantity: {0}")]
    InvalidQuantity(i32),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}
