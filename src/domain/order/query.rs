use serde::Deserialize;
use std::cmp::Ordering;

use super::aggregate::Order;
use super::value_objects::OrderStatus;

// ============================================================================
// Order Listing - filter + whitelisted sort
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    /// Case-insensitive substring of the order number
    pub order_number: Option<String>,
    pub status: Option<OrderStatus>,
    pub order_by: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    OrderNumber,
    Amount,
    Status,
    CustomerName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for OrderSort {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            direction: SortDirection::Desc,
        }
    }
}

impl OrderQuery {
    /// Resolve the requested sort. Both the field and the direction must be
    /// whitelisted, otherwise listing falls back to newest first.
    pub fn sort(&self) -> OrderSort {
        let field = match self.order_by.as_deref() {
            Some("orderNumber") => Some(SortField::OrderNumber),
            Some("amount") => Some(SortField::Amount),
            Some("status") => Some(SortField::Status),
            Some("customerName") => Some(SortField::CustomerName),
            _ => None,
        };
        let direction = match self.order.as_deref() {
            Some("asc") => Some(SortDirection::Asc),
            Some("desc") => Some(SortDirection::Desc),
            _ => None,
        };

        match (field, direction) {
            (Some(field), Some(direction)) => OrderSort { field, direction },
            _ => OrderSort::default(),
        }
    }

    pub fn matches(&self, order: &Order) -> bool {
        let number_ok = match self.order_number.as_deref() {
            Some(needle) if !needle.is_empty() => order
                .order_number
                .as_str()
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        };

        number_ok && self.status.map_or(true, |s| s == order.status)
    }
}

impl OrderSort {
    /// In-process ordering, equivalent to the SQL `ORDER BY` the PostgreSQL
    /// backend emits. Text fields compare case-insensitively.
    pub fn compare(&self, a: &Order, b: &Order) -> Ordering {
        let ordering = match self.field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::OrderNumber => a.order_number.cmp(&b.order_number),
            SortField::Amount => a.amount.cmp(&b.amount),
            SortField::Status => a.status.as_str().cmp(b.status.as_str()),
            SortField::CustomerName => a
                .customer_name
                .to_lowercase()
                .cmp(&b.customer_name.to_lowercase()),
        };

        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
