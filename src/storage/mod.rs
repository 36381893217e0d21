// ============================================================================
// Storage Layer - persistence seams for the domain
// ============================================================================
//
// Each trait is one collaborator the domain talks to. Both backends
// implement all of them:
// - memory   - tokio-lock guarded maps (tests, no DATABASE_URL)
// - postgres - sqlx PgPool
//
// Every mutation that must be race-free (stock reservation, counter
// increment, status change, cancellation with its restock) is a single
// atomic operation on the backend.
//
// ============================================================================

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::DatabaseConfig;
use crate::domain::order::{Order, OrderId, OrderNumber, OrderQuery, OrderStatus};
use crate::domain::product::{Product, ProductId, ProductQuery};

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Authoritative record of product stock
#[async_trait]
pub trait ProductLedger: Send + Sync {
    /// Products that exist among `ids`; missing ids are silently omitted
    async fn find_many(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>>;

    /// Apply `delta` to the quantity without a floor check.
    /// Returns `None` when the product does not exist.
    async fn adjust_quantity(&self, id: ProductId, delta: i32) -> StoreResult<Option<Product>>;

    /// Atomically take `qty` units if at least that many are available.
    /// Returns `None` when the product is missing or stock is insufficient.
    async fn reserve(&self, id: ProductId, qty: i32) -> StoreResult<Option<Product>>;
}

/// Catalog management
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn insert(&self, product: &Product) -> StoreResult<()>;
    async fn find_by_id(&self, id: ProductId) -> StoreResult<Option<Product>>;
    async fn find_all(&self, query: &ProductQuery) -> StoreResult<Vec<Product>>;
    /// Returns `false` when the product no longer exists
    async fn update(&self, product: &Product) -> StoreResult<bool>;
    async fn delete(&self, id: ProductId) -> StoreResult<bool>;
}

/// Durable order-number counter
#[async_trait]
pub trait OrderSequence: Send + Sync {
    /// Atomic read-increment-write; the counter starts at 0 when absent
    async fn next(&self) -> StoreResult<OrderNumber>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert(&self, order: &Order) -> StoreResult<()>;
    async fn find_by_id(&self, id: OrderId) -> StoreResult<Option<Order>>;
    async fn find_all(&self, query: &OrderQuery) -> StoreResult<Vec<Order>>;
    async fn delete(&self, id: OrderId) -> StoreResult<bool>;

    /// Compare-and-set: write `next` only if the stored status is still
    /// `expected`. Returns the updated order, or `None` if the order is gone
    /// or its status moved on.
    async fn transition_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> StoreResult<Option<Order>>;

    /// Compare-and-set to CANCELLED and give `restock` back to the ledger as
    /// one atomic unit: either both happen or neither does. Products that no
    /// longer exist are skipped and reported in `Cancellation::missing`.
    /// Returns `None` under the same conditions as `transition_status`.
    async fn cancel(
        &self,
        id: OrderId,
        expected: OrderStatus,
        restock: &BTreeMap<ProductId, i32>,
    ) -> StoreResult<Option<Cancellation>>;
}

/// Outcome of a successful `OrderRepository::cancel`
#[derive(Debug, Clone)]
pub struct Cancellation {
    pub order: Order,
    /// Products from the order that were deleted before it was cancelled
    pub missing: Vec<ProductId>,
}

/// Read-only aggregates for the dashboard
#[async_trait]
pub trait AnalyticsSource: Send + Sync {
    async fn count_products(&self) -> StoreResult<i64>;
    async fn count_orders(&self, status: Option<OrderStatus>) -> StoreResult<i64>;
    async fn revenue(&self, status: OrderStatus) -> StoreResult<Decimal>;
    /// Orders created in `[since, until)`, grouped by UTC calendar day
    async fn daily_order_counts(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<Vec<(NaiveDate, i64)>>;
    /// Products by total quantity ordered, highest first
    async fn top_selling(&self, limit: i64) -> StoreResult<Vec<(ProductId, i64)>>;
}

// ============================================================================
// Backend wiring
// ============================================================================

/// One backend, exposed through every storage seam
#[derive(Clone)]
pub struct Stores {
    pub ledger: Arc<dyn ProductLedger>,
    pub products: Arc<dyn ProductRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub sequence: Arc<dyn OrderSequence>,
    pub analytics: Arc<dyn AnalyticsSource>,
}

impl Stores {
    pub fn from_backend<B>(backend: B) -> Self
    where
        B: ProductLedger
            + ProductRepository
            + OrderRepository
            + OrderSequence
            + AnalyticsSource
            + 'static,
    {
        let backend = Arc::new(backend);
        Self {
            ledger: backend.clone(),
            products: backend.clone(),
            orders: backend.clone(),
            sequence: backend.clone(),
            analytics: backend,
        }
    }

    pub fn in_memory() -> Self {
        Self::from_backend(InMemoryStore::default())
    }
}

/// Connect to PostgreSQL when a URL is configured, otherwise fall back to
/// the in-memory backend.
pub async fn open(config: &DatabaseConfig) -> anyhow::Result<Stores> {
    let Some(url) = config.url.as_deref() else {
        tracing::warn!("DATABASE_URL not set, using in-memory storage (data is lost on restart)");
        return Ok(Stores::in_memory());
    };

    tracing::info!(max_connections = config.max_connections, "Connecting to PostgreSQL...");
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(url)
        .await?;

    let store = PostgresStore::new(pool);
    store.migrate().await?;
    tracing::info!("✅ PostgreSQL storage ready");

    Ok(Stores::from_backend(store))
}
