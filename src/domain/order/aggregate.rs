use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::product::{Product, ProductId};
use super::commands::PlaceOrder;
use super::errors::OrderError;
use super::value_objects::{Address, OrderId, OrderItem, OrderNumber, OrderStatus};

// ============================================================================
// Order Aggregate - Domain Logic
// ============================================================================
//
// Invariants:
// - `amount` is Σ(unit price at placement × qty) over `items`, priced from
//   the ledger, never from the client
// - `items` never change after placement
// - status only moves forward; CANCELLED is reachable from any
//   non-terminal state and its stock reversal happens exactly once
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    // Identity
    pub id: OrderId,
    pub order_number: OrderNumber,

    // Contents
    pub items: Vec<OrderItem>,
    pub amount: Decimal,
    pub status: OrderStatus,
    pub note: Option<String>,

    // Customer
    pub customer_name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub billing_address: Address,
    pub shipping_address: Option<Address>,

    // Audit Trail
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of checking a requested status against the current one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// Requested status equals the current one
    Unchanged,
    /// Status must be written; `restock` is set when moving to CANCELLED
    Apply { restock: bool },
}

/// Requested quantity per distinct product. Repeated lines for the same
/// product are summed; a sum beyond `i32::MAX` is an invalid quantity.
pub fn requested_quantities(items: &[OrderItem]) -> Result<BTreeMap<ProductId, i32>, OrderError> {
    let mut requested: BTreeMap<ProductId, i32> = BTreeMap::new();
    for item in items {
        let total = requested.entry(item.product).or_insert(0);
        *total = total
            .checked_add(item.qty)
            .ok_or(OrderError::InvalidQuantity(item.qty))?;
    }
    Ok(requested)
}

impl Order {
    /// Check availability of every requested product and price the order.
    ///
    /// Runs against a snapshot of the ledger and mutates nothing, so a
    /// rejection here leaves stock untouched.
    pub fn quote(
        requested: &BTreeMap<ProductId, i32>,
        products: &[Product],
    ) -> Result<Decimal, OrderError> {
        let mut found = 0usize;
        let mut total = Decimal::ZERO;

        for product in products {
            let Some(&qty) = requested.get(&product.id) else {
                continue;
            };
            found += 1;

            if qty <= 0 || product.qty < qty {
                return Err(OrderError::Unprocessable);
            }
            total = product
                .price
                .checked_mul(Decimal::from(qty))
                .and_then(|line| total.checked_add(line))
                .ok_or(OrderError::Unprocessable)?;
        }

        if found < requested.len() {
            return Err(OrderError::Unprocessable);
        }

        Ok(total)
    }

    /// Build a freshly placed order in PENDING
    pub fn place(command: PlaceOrder, order_number: OrderNumber, amount: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            order_number,
            items: command.items,
            amount,
            status: OrderStatus::Pending,
            note: command.note,
            customer_name: command.customer_name,
            phone_number: command.phone_number,
            email: command.email,
            billing_address: command.billing_address,
            shipping_address: command.shipping_address,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate a status change against the lifecycle
    pub fn plan_transition(&self, next: OrderStatus) -> Result<StatusChange, OrderError> {
        if next == self.status {
            return Ok(StatusChange::Unchanged);
        }

        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidStatusTransition {
                from: self.status,
                to: next,
            });
        }

        Ok(StatusChange::Apply {
            restock: next == OrderStatus::Cancelled,
        })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
