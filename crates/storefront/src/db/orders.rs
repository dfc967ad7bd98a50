//! Order persistence for the storefront side: inserts during checkout and
//! reads for the account order history.
//!
//! Order items are snapshots. Product name, variant name, SKU, and unit
//! price are copied at checkout time so later catalog edits never change
//! what a customer sees on a placed order.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

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

/// Snapshot of one cart line at the moment of checkout.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub sku: Option<String>,
    pub unit_price: Money,
    pub quantity: i32,
    pub line_total: Money,
}

/// Insert the order header. Runs inside the checkout transaction.
///
/// New orders start with `pending` status and `pending` payment.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_order(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
    email: &str,
    shipping: &ShippingAddress,
    subtotal: Money,
    total: Money,
) -> Result<OrderId, RepositoryError> {
    let id: i32 = sqlx::query_scalar(
        "INSERT INTO shop.orders
             (user_id, email, status, payment_status,
              shipping_name, shipping_address1, shipping_address2,
              shipping_city, shipping_postal_code, shipping_country,
              subtotal, total)
         VALUES ($1, $2, 'pending', 'pending', $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING id",
    )
    .bind(user_id)
    .bind(email)
    .bind(&shipping.name)
    .bind(&shipping.address1)
    .bind(&shipping.address2)
    .bind(&shipping.city)
    .bind(&shipping.postal_code)
    .bind(&shipping.country)
    .bind(subtotal)
    .bind(total)
    .fetch_one(&mut **tx)
    .await?;

    Ok(OrderId::new(id))
}

/// Insert one snapshot line. Runs inside the checkout transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_order_item(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
    item: &NewOrderItem,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO shop.order_items
             (order_id, product_id, product_name, variant_name, sku,
              unit_price, quantity, line_total)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(order_id)
    .bind(item.product_id)
    .bind(&item.product_name)
    .bind(&item.variant_name)
    .bind(&item.sku)
    .bind(item.unit_price)
    .bind(item.quantity)
    .bind(item.line_total)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// List a user's orders, newest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if a stored status is invalid.
pub async fn list_for_user(pool: &PgPool, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
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
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Order::try_from).collect()
}

/// Fetch one order, verifying it belongs to the user.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if a stored status is invalid.
pub async fn get_for_user(
    pool: &PgPool,
    user_id: UserId,
    order_id: OrderId,
) -> Result<Option<Order>, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(
        "SELECT id, user_id, email, status, payment_status,
                shipping_name, shipping_address1, shipping_address2,
                shipping_city, shipping_postal_code, shipping_country,
                subtotal, total, created_at, updated_at
         FROM shop.orders
         WHERE id = $1 AND user_id = $2",
    )
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.map(Order::try_from).transpose()
}

/// List an order's snapshot lines in insertion order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_items(pool: &PgPool, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
    let rows = sqlx::query_as::<_, OrderItemRow>(
        "SELECT id, order_id, product_id, product_name, variant_name, sku,
                unit_price, quantity, line_total
         FROM shop.order_items
         WHERE order_id = $1
         ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(OrderItem::from).collect())
}
