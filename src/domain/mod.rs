// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Each area has its own subdirectory:
// - product - catalog and stock ledger entries
// - order   - placement, lifecycle, stock reversal
// - stats   - dashboard analytics
//
// Persistence lives behind the traits in `crate::storage`.
//
// ============================================================================

pub mod product;
pub mod order;
pub mod stats;
