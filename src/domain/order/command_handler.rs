use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use rust_decimal::Decimal;

use crate::domain::product::ProductId;
use crate::metrics::Metrics;
use crate::storage::{OrderRepository, OrderSequence, ProductLedger, Stores};

use super::aggregate::{requested_quantities, Order, StatusChange};
use super::commands::{PlaceOrder, UpdateOrderStatus};
use super::errors::OrderError;
use super::query::OrderQuery;
use super::value_objects::OrderId;

// ============================================================================
// Order Command Handler
// ============================================================================
//
// Orchestrates: Request → Ledger check → Reservation → Order number →
// Order record, and the stock reversal on cancellation.
//
// Placement is a compensating sequence rather than one transaction:
// 1. price + availability check against a ledger snapshot (no writes)
// 2. atomic conditional reservation per product; a failed reservation
//    releases the ones already taken
// 3. mint the order number, persist the order; a failure here releases
//    every reservation
//
// Cancellation is a single store operation: status CAS plus restock.
//
// ============================================================================

pub struct OrderCommandHandler {
    ledger: Arc<dyn ProductLedger>,
    orders: Arc<dyn OrderRepository>,
    sequence: Arc<dyn OrderSequence>,
    metrics: Arc<Metrics>,
}

impl OrderCommandHandler {
    pub fn new(stores: &Stores, metrics: Arc<Metrics>) -> Self {
        Self {
            ledger: stores.ledger.clone(),
            orders: stores.orders.clone(),
            sequence: stores.sequence.clone(),
            metrics,
        }
    }

    /// Place a new order, reserving stock for every item
    pub async fn create(&self, command: PlaceOrder) -> Result<Order, OrderError> {
        let started = Instant::now();

        if let Err(e) = command.validate() {
            self.metrics.record_rejection("invalid_request");
            return Err(e);
        }

        let requested = match requested_quantities(&command.items) {
            Ok(requested) => requested,
            Err(e) => {
                self.metrics.record_rejection("invalid_request");
                return Err(e);
            }
        };
        let ids: Vec<ProductId> = requested.keys().copied().collect();
        let products = self.ledger.find_many(&ids).await?;

        let amount = match Order::quote(&requested, &products) {
            Ok(amount) => amount,
            Err(e) => {
                tracing::info!(
                    requested = requested.len(),
                    found = products.len(),
                    "Order rejected: items invalid or unavailable"
                );
                self.metrics.record_rejection("unavailable");
                return Err(e);
            }
        };

        self.reserve_all(&requested).await?;

        let order = match self.persist(command, amount).await {
            Ok(order) => order,
            Err(e) => {
                tracing::error!(error = %e, "Failed to persist order, releasing reserved stock");
                self.release(&requested).await;
                return Err(e);
            }
        };

        self.metrics.record_order_placed(started.elapsed().as_secs_f64());
        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            amount = %order.amount,
            item_count = order.items.len(),
            "✅ Order placed"
        );

        Ok(order)
    }

    async fn persist(&self, command: PlaceOrder, amount: Decimal) -> Result<Order, OrderError> {
        let order_number = self.sequence.next().await?;
        let order = Order::place(command, order_number, amount);
        self.orders.insert(&order).await?;
        Ok(order)
    }

    /// All-or-nothing reservation. Stock drained by a concurrent order after
    /// the snapshot check makes the conditional reservation fail here.
    async fn reserve_all(&self, requested: &BTreeMap<ProductId, i32>) -> Result<(), OrderError> {
        let mut reserved: BTreeMap<ProductId, i32> = BTreeMap::new();

        for (&product_id, &qty) in requested {
            let outcome = self.ledger.reserve(product_id, qty).await;
            match outcome {
                Ok(Some(_)) => {
                    reserved.insert(product_id, qty);
                }
                Ok(None) => {
                    tracing::info!(
                        product_id = %product_id,
                        qty,
                        "Reservation lost to a concurrent order"
                    );
                    self.release(&reserved).await;
                    self.metrics.record_rejection("unavailable");
                    return Err(OrderError::Unprocessable);
                }
                Err(e) => {
                    self.release(&reserved).await;
                    return Err(e.into());
                }
            }
        }

        Ok(())
    }

    /// Give reserved units back. Failures are logged and counted, not returned.
    async fn release(&self, reserved: &BTreeMap<ProductId, i32>) {
        for (&product_id, &qty) in reserved {
            match self.ledger.adjust_quantity(product_id, qty).await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    tracing::error!(product_id = %product_id, qty, "Cannot release stock: product vanished");
                    self.metrics.record_compensation_failure();
                }
                Err(e) => {
                    tracing::error!(product_id = %product_id, qty, error = %e, "Cannot release stock");
                    self.metrics.record_compensation_failure();
                }
            }
        }
    }

    /// Move an order to a new status; cancelling returns its stock once
    pub async fn update_status(
        &self,
        id: OrderId,
        command: UpdateOrderStatus,
    ) -> Result<Order, OrderError> {
        let next = command.status;

        // Compare-and-set loop: a lost race re-reads the order and re-plans.
        // The lifecycle only moves forward, so this terminates.
        loop {
            let order = self.find_by_id(id).await?;

            let restock = match order.plan_transition(next)? {
                StatusChange::Unchanged => return Ok(order),
                StatusChange::Apply { restock } => restock,
            };

            let updated = if restock {
                self.cancel(&order).await?
            } else {
                self.orders.transition_status(id, order.status, next).await?
            };

            let Some(updated) = updated else {
                tracing::debug!(order_id = %id, "Status changed concurrently, re-reading order");
                continue;
            };

            self.metrics.record_status_change(next.as_str());
            tracing::info!(
                order_id = %id,
                from = %order.status,
                to = %next,
                "Order status updated"
            );

            return Ok(updated);
        }
    }

    /// Cancel and restock in one store operation. A store failure leaves
    /// both the status and the ledger untouched, so the cancel can be retried.
    async fn cancel(&self, order: &Order) -> Result<Option<Order>, OrderError> {
        let restock = requested_quantities(&order.items)?;

        let cancellation = match self.orders.cancel(order.id, order.status, &restock).await {
            Ok(Some(cancellation)) => cancellation,
            Ok(None) => return Ok(None),
            Err(e) => {
                tracing::error!(
                    order_id = %order.id,
                    error = %e,
                    "Failed to cancel order, status and stock unchanged"
                );
                return Err(e.into());
            }
        };

        for product_id in &cancellation.missing {
            tracing::warn!(
                order_id = %order.id,
                product_id = %product_id,
                "Product no longer exists, nothing to restock"
            );
        }

        self.metrics.record_stock_reversal();
        tracing::info!(order_id = %order.id, "Stock returned for cancelled order");
        Ok(Some(cancellation.order))
    }

    /// Delete an order. Stock is not returned and the number is not reused.
    pub async fn delete(&self, id: OrderId) -> Result<bool, OrderError> {
        self.find_by_id(id).await?;
        let deleted = self.orders.delete(id).await?;
        tracing::info!(order_id = %id, deleted, "Order deleted");
        Ok(deleted)
    }

    pub async fn find_by_id(&self, id: OrderId) -> Result<Order, OrderError> {
        self.orders
            .find_by_id(id)
            .await?
            .ok_or(OrderError::NotFound(id))
    }

    pub async fn find_all(&self, query: &OrderQuery) -> Result<Vec<Order>, OrderError> {
        Ok(self.orders.find_all(query).await?)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
