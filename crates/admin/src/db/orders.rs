//! Order reads and status updates for the back office.
//!
//! The storefront creates orders; this side only lists them, shows their
//! snapshot lines, and walks `status` through the lifecycle. Items are never
//! edited here, an order's contents are frozen at checkout.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use wildbloom_core::{
    Email, Money, OrderId, OrderItemId, OrderStatus, PaymentStatus, ProductId, UserId,
};

use super::RepositoryError;
use crate::models::order::{Order, OrderItem, ShippingAddress};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    email: String,
    status: String,
    payment_status: String,
    shipping_name: String,
    shipping_address1: String,
    shipping_address2: Option<String>,
    shipping_city: String,
    shipping_postal_code: String,
    shipping_country: String,
    subtotal: Decimal,
    total: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::from_str(&row.status)
            .map_err(RepositoryError::DataCorruption)?;
        let payment_status = PaymentStatus::from_str(&row.payment_status)
            .map_err(RepositoryError::DataCorruption)?;
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            email,
            status,
            payment_status,
            shipping: ShippingAddress {
                name: row.shipping_name,
                address1: row.shipping_address1,
                address2: row.shipping_address2,
                city: row.shipping_city,
                postal_code: row.shipping_postal_code,
                country: row.shipping_country,
            },
            subtotal: Money::from_decimal(row.subtotal),
            total: Money::from_decimal(row.total),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: Option<i32>,
    product_name: String,
    variant_name: Option<String>,
    sku: Option<String>,
    unit_price: Decimal,
    quantity: i32,
    line_total: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: row.product_id.map(ProductId::new),
            product_name: row.product_name,
            variant_name: row.variant_name,
            sku: row.sku,
            unit_price: Money::from_decimal(row.unit_price),
            quantity: row.quantity,
            line_total: Money::from_decimal(row.line_total),
        }
    }
}

/// Repository for order management.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List orders newest first, optionally restricted to one status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored status is invalid.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT id, user_id, email, status, payment_status,
                    shipping_name, shipping_address1, shipping_address2,
                    shipping_city, shipping_postal_code, shipping_country,
                    subtotal, total, created_at, updated_at
             FROM shop.orders
             WHERE $1::text IS NULL OR status = $1
             ORDER BY created_at DESC, id DESC",
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// List a customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored status is invalid.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT id, user_id, email, status, payment_status,
                    shipping_name, shipping_address1, shipping_address2,
                    shipping_city, shipping_postal_code, shipping_country,
                    subtotal, total, created_at, updated_at
             FROM shop.orders
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// The most recently placed orders, for the dashboard.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored status is invalid.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT id, user_id, email, status, payment_status,
                    shipping_name, shipping_address1, shipping_address2,
                    shipping_city, shipping_postal_code, shipping_country,
                    subtotal, total, created_at, updated_at
             FROM shop.orders
             ORDER BY created_at DESC, id DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Fetch one order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored status is invalid.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            "SELECT id, user_id, email, status, payment_status,
                    shipping_name, shipping_address1, shipping_address2,
                    shipping_city, shipping_postal_code, shipping_country,
                    subtotal, total, created_at, updated_at
             FROM shop.orders
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// List an order's snapshot lines in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            "SELECT id, order_id, product_id, product_name, variant_name, sku,
                    unit_price, quantity, line_total
             FROM shop.order_items
             WHERE order_id = $1
             ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    /// Move an order's status, guarded by the status the caller last saw.
    ///
    /// The `from` guard makes the update atomic: if another admin changed the
    /// order between the caller's read and this write, no row matches and the
    /// caller gets `Conflict` instead of silently clobbering their change.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order's status is no longer
    /// `from` (or the order was deleted out from under us).
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.orders
             SET status = $1, updated_at = now()
             WHERE id = $2 AND status = $3",
        )
        .bind(to.as_str())
        .bind(id)
        .bind(from.as_str())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(
                "order status changed concurrently".to_owned(),
            ));
        }

        Ok(())
    }

    /// Mark an order paid. Manual bookkeeping until a gateway is wired in.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_payment_status(
        &self,
        id: OrderId,
        payment_status: PaymentStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.orders
             SET payment_status = $1, updated_at = now()
             WHERE id = $2",
        )
        .bind(payment_status.as_str())
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Order counts grouped by status. Statuses with no orders are absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored status is invalid.
    pub async fn status_counts(&self) -> Result<Vec<(OrderStatus, i64)>, RepositoryError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM shop.orders GROUP BY status",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|(status, count)| {
                let status =
                    OrderStatus::from_str(&status).map_err(RepositoryError::DataCorruption)?;
                Ok((status, count))
            })
            .collect()
    }
}
