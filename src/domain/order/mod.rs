// ============================================================================
// Order Domain - Placement and lifecycle of customer orders
// ============================================================================
//
// This module contains ALL Order-specific code:
// - Value objects (OrderId, OrderNumber, OrderItem, Address, OrderStatus)
// - Commands (PlaceOrder, UpdateOrderStatus)
// - Errors (OrderError enum)
// - Aggregate (Order with pricing and lifecycle rules)
// - Query (listing filter and whitelisted sort)
// - Command Handler (OrderCommandHandler)
//
// Storage is reached only through the traits in `crate::storage`.
//
// ============================================================================

pub mod value_objects;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod query;
pub mod command_handler;

// Re-export for convenience
pub use value_objects::{Address, OrderId, OrderItem, OrderNumber, OrderStatus};
pub use commands::{PlaceOrder, UpdateOrderStatus};
pub use errors::OrderError;
pub use aggregate::Order;
pub use query::{OrderQuery, SortDirection, SortField};
pub use command_handler::OrderCommandHandler;
