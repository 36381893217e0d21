use super::value_objects::ProductId;
use crate::storage::StoreError;

// ============================================================================
// Product Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ProductError {
    #[error("Product not found")]
    NotFound(ProductId),

    #[error("Product name cannot be empty")]
    EmptyName,

    #[error("Product quantity cannot be negative: {0}")]
    NegativeQuantity(i32),

    #[error("Product price cannot be negative")]
    NegativePrice,

    #[error(transparent)]
    Store(#[from] StoreError),
}
