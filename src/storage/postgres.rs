use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::domain::order::{
    Address, Order, OrderId, OrderItem, OrderNumber, OrderQuery, OrderStatus, SortDirection,
    SortField,
};
use crate::domain::product::{Product, ProductId, ProductQuery};
use super::{
    AnalyticsSource, Cancellation, OrderRepository, OrderSequence, ProductLedger, ProductRepository,
    StoreError, StoreResult,
};

// ============================================================================
// PostgreSQL Store
// ============================================================================
//
// Tables:
// - products           - catalog + ledger balance (`qty`)
// - orders             - items and addresses as JSONB
// - last_order_number  - single-row counter (id = 1)
//
// Race-sensitive writes are single statements:
// - reserve            UPDATE .. WHERE qty >= $n
// - next order number  INSERT .. ON CONFLICT DO UPDATE .. RETURNING
// - status change      UPDATE .. WHERE status = $expected
// - cancellation       the status change plus restock in one transaction
//
// ============================================================================

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS products (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT,
        qty INTEGER NOT NULL,
        price NUMERIC NOT NULL CHECK (price >= 0),
        category TEXT NOT NULL CHECK (category IN ('CLAY', 'TEXTILES', 'WOOD')),
        image TEXT,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS orders (
        id UUID PRIMARY KEY,
        order_number TEXT NOT NULL UNIQUE,
        items JSONB NOT NULL,
        amount NUMERIC NOT NULL,
        status TEXT NOT NULL CHECK (status IN ('PENDING', 'PROCESSING', 'COMPLETED', 'CANCELLED')),
        note TEXT,
        customer_name TEXT NOT NULL,
        phone_number TEXT NOT NULL,
        email TEXT,
        billing_address JSONB NOT NULL,
        shipping_address JSONB,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS orders_created_at_idx ON orders (created_at)",
    "CREATE TABLE IF NOT EXISTS last_order_number (
        id SMALLINT PRIMARY KEY CHECK (id = 1),
        number BIGINT NOT NULL
    )",
];

const PRODUCT_COLUMNS: &str =
    "id, name, description, qty, price, category, image, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, order_number, items, amount, status, note, customer_name, \
     phone_number, email, billing_address, shipping_address, created_at, updated_at";

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create tables if they do not exist yet
    pub async fn migrate(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::debug!(statements = SCHEMA.len(), "Schema ensured");
        Ok(())
    }
}

// ============================================================================
// Row mapping
// ============================================================================

fn product_from_row(row: &PgRow) -> StoreResult<Product> {
    let category: String = row.try_get("category")?;
    Ok(Product {
        id: ProductId(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        qty: row.try_get("qty")?,
        price: row.try_get("price")?,
        category: category.parse().map_err(StoreError::Corrupt)?,
        image: row.try_get("image")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn order_from_row(row: &PgRow) -> StoreResult<Order> {
    let status: String = row.try_get("status")?;
    let Json(items): Json<Vec<OrderItem>> = row.try_get("items")?;
    let Json(billing_address): Json<Address> = row.try_get("billing_address")?;
    let shipping_address: Option<Json<Address>> = row.try_get("shipping_address")?;
    let order_number: String = row.try_get("order_number")?;

    Ok(Order {
        id: OrderId(row.try_get("id")?),
        order_number: OrderNumber::from(order_number),
        items,
        amount: row.try_get("amount")?,
        status: status.parse().map_err(StoreError::Corrupt)?,
        note: row.try_get("note")?,
        customer_name: row.try_get("customer_name")?,
        phone_number: row.try_get("phone_number")?,
        email: row.try_get("email")?,
        billing_address,
        shipping_address: shipping_address.map(|Json(a)| a),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Escape LIKE wildcards so user input only ever matches literally
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::CreatedAt => "created_at",
        SortField::OrderNumber => "order_number",
        SortField::Amount => "amount",
        SortField::Status => "status",
        SortField::CustomerName => "lower(customer_name)",
    }
}

fn sort_direction(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    }
}

// ============================================================================
// Product Ledger
// ============================================================================

#[async_trait]
impl ProductLedger for PostgresStore {
    async fn find_many(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>> {
        let ids: Vec<Uuid> = ids.iter().map(|id| id.0).collect();
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(product_from_row).collect()
    }

    async fn adjust_quantity(&self, id: ProductId, delta: i32) -> StoreResult<Option<Product>> {
        let row = sqlx::query(&format!(
            "UPDATE products SET qty = qty + $2, updated_at = now()
             WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.0)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn reserve(&self, id: ProductId, qty: i32) -> StoreResult<Option<Product>> {
        let row = sqlx::query(&format!(
            "UPDATE products SET qty = qty - $2, updated_at = now()
             WHERE id = $1 AND qty >= $2
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.0)
        .bind(qty)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(product_from_row).transpose()
    }
}

// ============================================================================
// Product Repository
// ============================================================================

#[async_trait]
impl ProductRepository for PostgresStore {
    async fn insert(&self, product: &Product) -> StoreResult<()> {
        sqlx::query(&format!(
            "INSERT INTO products ({PRODUCT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(product.id.0)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.qty)
        .bind(product.price)
        .bind(product.category.as_str())
        .bind(&product.image)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn find_all(&self, query: &ProductQuery) -> StoreResult<Vec<Product>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE"));

        if let Some(name) = query.name.as_deref().filter(|n| !n.is_empty()) {
            builder.push(" AND name ILIKE ").push_bind(like_pattern(name));
        }
        if let Some(category) = query.category {
            builder.push(" AND category = ").push_bind(category.as_str());
        }
        builder.push(" ORDER BY lower(name) ASC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(product_from_row).collect()
    }

    async fn update(&self, product: &Product) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE products
             SET name = $2, description = $3, qty = $4, price = $5, category = $6,
                 image = $7, updated_at = $8
             WHERE id = $1",
        )
        .bind(product.id.0)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.qty)
        .bind(product.price)
        .bind(product.category.as_str())
        .bind(&product.image)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: ProductId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// Order Sequence
// ============================================================================

#[async_trait]
impl OrderSequence for PostgresStore {
    async fn next(&self) -> StoreResult<OrderNumber> {
        let value: i64 = sqlx::query_scalar(
            "INSERT INTO last_order_number (id, number) VALUES (1, 1)
             ON CONFLICT (id) DO UPDATE SET number = last_order_number.number + 1
             RETURNING number",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(OrderNumber::from_sequence(value))
    }
}

// ============================================================================
// Order Repository
// ============================================================================

#[async_trait]
impl OrderRepository for PostgresStore {
    async fn insert(&self, order: &Order) -> StoreResult<()> {
        sqlx::query(&format!(
            "INSERT INTO orders ({ORDER_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        ))
        .bind(order.id.0)
        .bind(order.order_number.as_str())
        .bind(Json(&order.items))
        .bind(order.amount)
        .bind(order.status.as_str())
        .bind(&order.note)
        .bind(&order.customer_name)
        .bind(&order.phone_number)
        .bind(&order.email)
        .bind(Json(&order.billing_address))
        .bind(order.shipping_address.as_ref().map(Json))
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(order_from_row).transpose()
    }

    async fn find_all(&self, query: &OrderQuery) -> StoreResult<Vec<Order>> {
        let sort = query.sort();
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders WHERE TRUE"));

        if let Some(number) = query.order_number.as_deref().filter(|n| !n.is_empty()) {
            builder.push(" AND order_number ILIKE ").push_bind(like_pattern(number));
        }
        if let Some(status) = query.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        builder
            .push(" ORDER BY ")
            .push(sort_column(sort.field))
            .push(" ")
            .push(sort_direction(sort.direction));

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(order_from_row).collect()
    }

    async fn delete(&self, id: OrderId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn transition_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> StoreResult<Option<Order>> {
        let row = sqlx::query(&format!(
            "UPDATE orders SET status = $3, updated_at = now()
             WHERE id = $1 AND status = $2
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id.0)
        .bind(expected.as_str())
        .bind(next.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(order_from_row).transpose()
    }

    async fn cancel(
        &self,
        id: OrderId,
        expected: OrderStatus,
        restock: &BTreeMap<ProductId, i32>,
    ) -> StoreResult<Option<Cancellation>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "UPDATE orders SET status = $3, updated_at = now()
             WHERE id = $1 AND status = $2
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id.0)
        .bind(expected.as_str())
        .bind(OrderStatus::Cancelled.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        // Dropping `tx` without commit rolls back
        let Some(row) = row else {
            return Ok(None);
        };
        let order = order_from_row(&row)?;

        let mut missing = Vec::new();
        for (&product_id, &qty) in restock {
            let result = sqlx::query(
                "UPDATE products SET qty = qty + $2, updated_at = now() WHERE id = $1",
            )
            .bind(product_id.0)
            .bind(qty)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                missing.push(product_id);
            }
        }

        tx.commit().await?;
        Ok(Some(Cancellation { order, missing }))
    }
}

// ============================================================================
// Analytics
// ============================================================================

#[async_trait]
impl AnalyticsSource for PostgresStore {
    async fn count_products(&self) -> StoreResult<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?)
    }

    async fn count_orders(&self, status: Option<OrderStatus>) -> StoreResult<i64> {
        let count: i64 = match status {
            Some(status) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status = $1")
                    .bind(status.as_str())
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM orders")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(count)
    }

    async fn revenue(&self, status: OrderStatus) -> StoreResult<Decimal> {
        Ok(sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0)::NUMERIC FROM orders WHERE status = $1",
        )
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await?)
    }

    async fn daily_order_counts(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<Vec<(NaiveDate, i64)>> {
        Ok(sqlx::query_as(
            "SELECT (created_at AT TIME ZONE 'UTC')::DATE AS day, COUNT(*) AS count
             FROM orders
             WHERE created_at >= $1 AND created_at < $2
             GROUP BY day
             ORDER BY day",
        )
        .bind(since)
        .bind(until)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn top_selling(&self, limit: i64) -> StoreResult<Vec<(ProductId, i64)>> {
        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            "SELECT (item->>'product')::UUID AS product_id,
                    SUM((item->>'qty')::BIGINT)::BIGINT AS sold
             FROM orders CROSS JOIN LATERAL jsonb_array_elements(items) AS item
             GROUP BY product_id
             ORDER BY sold DESC, product_id
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id, sold)| (ProductId(id), sold)).collect())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
