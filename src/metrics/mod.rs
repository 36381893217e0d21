// Private module declaration
mod server;

use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
};

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Order placement (throughput, latency, rejections)
// - Status changes and stock reversals on cancellation
// - Failed compensations (stock that could not be given back)
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Central metrics registry for the entire application
pub struct Metrics {
    registry: Registry,

    // Order Placement Metrics
    pub orders_placed: IntCounter,
    pub orders_rejected: IntCounterVec,
    pub order_placement_duration: Histogram,

    // Lifecycle Metrics
    pub order_status_changes: IntCounterVec,
    pub stock_reversals: IntCounter,
    pub stock_compensation_failures: IntCounter,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // Order Placement Metrics
        let orders_placed = IntCounter::new("orders_placed_total", "Total orders placed")?;
        registry.register(Box::new(orders_placed.clone()))?;

        let orders_rejected = IntCounterVec::new(
            Opts::new("orders_rejected_total", "Order placements rejected"),
            &["reason"],
        )?;
        registry.register(Box::new(orders_rejected.clone()))?;

        let order_placement_duration = Histogram::with_opts(
            HistogramOpts::new("order_placement_duration_seconds", "Order placement duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;
        registry.register(Box::new(order_placement_duration.clone()))?;

        // Lifecycle Metrics
        let order_status_changes = IntCounterVec::new(
            Opts::new("order_status_changes_total", "Order status changes by target status"),
            &["status"],
        )?;
        registry.register(Box::new(order_status_changes.clone()))?;

        let stock_reversals = IntCounter::new(
            "stock_reversals_total",
            "Cancelled orders whose stock was returned to the ledger",
        )?;
        registry.register(Box::new(stock_reversals.clone()))?;

        let stock_compensation_failures = IntCounter::new(
            "stock_compensation_failures_total",
            "Ledger adjustments that could not be applied while undoing or reversing a reservation",
        )?;
        registry.register(Box::new(stock_compensation_failures.clone()))?;

        Ok(Self {
            registry,
            orders_placed,
            orders_rejected,
            order_placement_duration,
            order_status_changes,
            stock_reversals,
            stock_compensation_failures,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Helper to record a successful placement
    pub fn record_order_placed(&self, duration_secs: f64) {
        self.orders_placed.inc();
        self.order_placement_duration.observe(duration_secs);
    }

    /// Helper to record a rejected placement
    pub fn record_rejection(&self, reason: &str) {
        self.orders_rejected.with_label_values(&[reason]).inc();
    }

    pub fn record_status_change(&self, status: &str) {
        self.order_status_changes.with_label_values(&[status]).inc();
    }

    pub fn record_stock_reversal(&self) {
        self.stock_reversals.inc();
    }

    pub fn record_compensation_failure(&self) {
        self.stock_compensation_failures.inc();
    }
}
