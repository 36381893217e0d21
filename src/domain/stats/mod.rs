// ============================================================================
// Stats Domain - Dashboard analytics over products and orders
// ============================================================================

pub mod service;

pub use service::{Analytics, DailyOrderCount, StatsService, TopSellingProduct};
