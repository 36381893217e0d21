use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::domain::order::{Order, OrderId, OrderNumber, OrderQuery, OrderStatus};
use crate::domain::product::{Product, ProductId, ProductQuery};
use super::{
    AnalyticsSource, Cancellation, OrderRepository, OrderSequence, ProductLedger, ProductRepository,
    StoreResult,
};

// ============================================================================
// In-Memory Store
// ============================================================================
//
// Thread-safe backend for tests and database-less runs. Every check-and-act
// happens while holding the write lock of the map it touches, which gives
// the same atomicity as the conditional SQL statements and transactions of
// the PostgreSQL backend.
//
// ============================================================================

#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    products: RwLock<HashMap<ProductId, Product>>,
    orders: RwLock<HashMap<OrderId, Order>>,
    last_order_number: Mutex<i64>,
}

#[async_trait]
impl ProductLedger for InMemoryStore {
    async fn find_many(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>> {
        let products = self.inner.products.read().await;
        let mut seen = Vec::with_capacity(ids.len());
        let mut found = Vec::with_capacity(ids.len());

        for id in ids {
            if seen.contains(id) {
                continue;
            }
            seen.push(*id);
            if let Some(product) = products.get(id) {
                found.push(product.clone());
            }
        }

        Ok(found)
    }

    async fn adjust_quantity(&self, id: ProductId, delta: i32) -> StoreResult<Option<Product>> {
        let mut products = self.inner.products.write().await;
        Ok(products.get_mut(&id).map(|product| {
            product.qty += delta;
            product.updated_at = Utc::now();
            product.clone()
        }))
    }

    async fn reserve(&self, id: ProductId, qty: i32) -> StoreResult<Option<Product>> {
        let mut products = self.inner.products.write().await;
        match products.get_mut(&id) {
            Some(product) if product.qty >= qty => {
                product.qty -= qty;
                product.updated_at = Utc::now();
                Ok(Some(product.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn insert(&self, product: &Product) -> StoreResult<()> {
        self.inner
            .products
            .write()
            .await
            .insert(product.id, product.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.inner.products.read().await.get(&id).cloned())
    }

    async fn find_all(&self, query: &ProductQuery) -> StoreResult<Vec<Product>> {
        let products = self.inner.products.read().await;
        let mut matching: Vec<Product> = products
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();

        matching.sort_by_key(|p| p.name.to_lowercase());
        Ok(matching)
    }

    async fn update(&self, product: &Product) -> StoreResult<bool> {
        let mut products = self.inner.products.write().await;
        match products.get_mut(&product.id) {
            Some(existing) => {
                *existing = product.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: ProductId) -> StoreResult<bool> {
        Ok(self.inner.products.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl OrderSequence for InMemoryStore {
    async fn next(&self) -> StoreResult<OrderNumber> {
        let mut counter = self.inner.last_order_number.lock().await;
        *counter += 1;
        Ok(OrderNumber::from_sequence(*counter))
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn insert(&self, order: &Order) -> StoreResult<()> {
        self.inner
            .orders
            .write()
            .await
            .insert(order.id, order.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.inner.orders.read().await.get(&id).cloned())
    }

    async fn find_all(&self, query: &OrderQuery) -> StoreResult<Vec<Order>> {
        let sort = query.sort();
        let orders = self.inner.orders.read().await;
        let mut matching: Vec<Order> = orders
            .values()
            .filter(|o| query.matches(o))
            .cloned()
            .collect();

        matching.sort_by(|a, b| sort.compare(a, b));
        Ok(matching)
    }

    async fn delete(&self, id: OrderId) -> StoreResult<bool> {
        Ok(self.inner.orders.write().await.remove(&id).is_some())
    }

    async fn transition_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> StoreResult<Option<Order>> {
        let mut orders = self.inner.orders.write().await;
        match orders.get_mut(&id) {
            Some(order) if order.status == expected => {
                order.status = next;
                order.updated_at = Utc::now();
                Ok(Some(order.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn cancel(
        &self,
        id: OrderId,
        expected: OrderStatus,
        restock: &BTreeMap<ProductId, i32>,
    ) -> StoreResult<Option<Cancellation>> {
        // Lock order: orders, then products. Nothing else holds both.
        let mut orders = self.inner.orders.write().await;
        let order = match orders.get_mut(&id) {
            Some(order) if order.status == expected => order,
            _ => return Ok(None),
        };

        let mut products = self.inner.products.write().await;
        let now = Utc::now();
        let mut missing = Vec::new();
        for (&product_id, &qty) in restock {
            match products.get_mut(&product_id) {
                Some(product) => {
                    product.qty += qty;
                    product.updated_at = now;
                }
                None => missing.push(product_id),
            }
        }

        order.status = OrderStatus::Cancelled;
        order.updated_at = now;
        Ok(Some(Cancellation {
            order: order.clone(),
            missing,
        }))
    }
}

#[async_trait]
impl AnalyticsSource for InMemoryStore {
    async fn count_products(&self) -> StoreResult<i64> {
        Ok(self.inner.products.read().await.len() as i64)
    }

    async fn count_orders(&self, status: Option<OrderStatus>) -> StoreResult<i64> {
        let orders = self.inner.orders.read().await;
        let count = orders
            .values()
            .filter(|o| status.map_or(true, |s| o.status == s))
            .count();
        Ok(count as i64)
    }

    async fn revenue(&self, status: OrderStatus) -> StoreResult<Decimal> {
        let orders = self.inner.orders.read().await;
        Ok(orders
            .values()
            .filter(|o| o.status == status)
            .map(|o| o.amount)
            .sum())
    }

    async fn daily_order_counts(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<Vec<(NaiveDate, i64)>> {
        let orders = self.inner.orders.read().await;
        let mut per_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();

        for order in orders.values() {
            if order.created_at >= since && order.created_at < until {
                *per_day.entry(order.created_at.date_naive()).or_insert(0) += 1;
            }
        }

        Ok(per_day.into_iter().collect())
    }

    async fn top_selling(&self, limit: i64) -> StoreResult<Vec<(ProductId, i64)>> {
        let orders = self.inner.orders.read().await;
        let mut sold: HashMap<ProductId, i64> = HashMap::new();

        for item in orders.values().flat_map(|o| o.items.iter()) {
            *sold.entry(item.product).or_insert(0) += i64::from(item.qty);
        }

        let mut ranked: Vec<(ProductId, i64)> = sold.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(ranked)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
