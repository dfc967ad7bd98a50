//! Cart item persistence.
//!
//! A cart row belongs to exactly one owner: a registered user or a guest
//! token, never both (enforced by a CHECK constraint). Every query here
//! binds both owner columns with `IS NOT DISTINCT FROM` so the same SQL
//! serves either kind of owner.
//!
//! Mutations that need a stock check run inside a caller-owned transaction
//! that locks the cart line before the product row, so every writer
//! acquires its locks in the same order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use wildbloom_core::{CartItemId, Money, ProductId, Slug, VariantId};

use super::RepositoryError;
use crate::models::cart::{CartLine, CartOwner};

/// A raw cart row, before joining catalog data. Used by merge and checkout.
#[derive(Debug, Clone, Copy)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub quantity: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: i32,
    product_id: i32,
    variant_id: Option<i32>,
    quantity: i32,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: CartItemId::new(row.id),
            product_id: ProductId::new(row.product_id),
            variant_id: row.variant_id.map(VariantId::new),
            quantity: row.quantity,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    id: i32,
    product_id: i32,
    product_slug: String,
    product_name: String,
    variant_id: Option<i32>,
    variant_name: Option<String>,
    quantity: i32,
    unit_price: Decimal,
    available: Option<i32>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        let product_slug = Slug::parse(&row.product_slug).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid slug in database: {e}"))
        })?;

        Ok(Self {
            id: CartItemId::new(row.id),
            product_id: ProductId::new(row.product_id),
            product_slug,
            product_name: row.product_name,
            variant_id: row.variant_id.map(VariantId::new),
            variant_name: row.variant_name,
            quantity: row.quantity,
            unit_price: Money::from_decimal(row.unit_price),
            available: row.available,
            updated_at: row.updated_at,
        })
    }
}

/// List the owner's cart joined with live catalog data, oldest line first.
///
/// Lines whose product has been deactivated drop out of the join; the
/// service layer treats their absence as removal.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if a stored slug is invalid.
pub async fn list_lines(
    pool: &PgPool,
    owner: CartOwner,
) -> Result<Vec<CartLine>, RepositoryError> {
    let (user_id, guest_token) = owner.into_columns();

    let rows = sqlx::query_as::<_, CartLineRow>(
        "SELECT ci.id, ci.product_id, p.slug AS product_slug, p.name AS product_name,
                ci.variant_id, v.name AS variant_name, ci.quantity,
                COALESCE(v.price, p.price) AS unit_price,
                CASE
                    WHEN NOT p.track_inventory THEN NULL
                    ELSE GREATEST(COALESCE(v.inventory_quantity, p.inventory_quantity), 0)
                END AS available,
                ci.updated_at
         FROM shop.cart_items ci
         JOIN shop.products p ON p.id = ci.product_id AND p.active
         LEFT JOIN shop.product_variants v ON v.id = ci.variant_id
         WHERE ci.user_id IS NOT DISTINCT FROM $1
           AND ci.guest_token IS NOT DISTINCT FROM $2
         ORDER BY ci.created_at, ci.id",
    )
    .bind(user_id)
    .bind(guest_token)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(CartLine::try_from).collect()
}

/// Total quantity across the owner's cart, for the header badge.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn count_items(pool: &PgPool, owner: CartOwner) -> Result<i64, RepositoryError> {
    let (user_id, guest_token) = owner.into_columns();

    let count: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(ci.quantity), 0)
         FROM shop.cart_items ci
         JOIN shop.products p ON p.id = ci.product_id AND p.active
         WHERE ci.user_id IS NOT DISTINCT FROM $1
           AND ci.guest_token IS NOT DISTINCT FROM $2",
    )
    .bind(user_id)
    .bind(guest_token)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Find the owner's line for a product/variant pair, locking it if present.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_line(
    tx: &mut Transaction<'_, Postgres>,
    owner: CartOwner,
    product_id: ProductId,
    variant_id: Option<VariantId>,
) -> Result<Option<CartItem>, RepositoryError> {
    let (user_id, guest_token) = owner.into_columns();

    let row = sqlx::query_as::<_, CartItemRow>(
        "SELECT id, product_id, variant_id, quantity
         FROM shop.cart_items
         WHERE user_id IS NOT DISTINCT FROM $1
           AND guest_token IS NOT DISTINCT FROM $2
           AND product_id = $3
           AND variant_id IS NOT DISTINCT FROM $4
         FOR UPDATE",
    )
    .bind(user_id)
    .bind(guest_token)
    .bind(product_id)
    .bind(variant_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(row.map(CartItem::from))
}

/// Look up a single line by ID, verifying it belongs to the owner.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_line(
    tx: &mut Transaction<'_, Postgres>,
    owner: CartOwner,
    line_id: CartItemId,
) -> Result<Option<CartItem>, RepositoryError> {
    let (user_id, guest_token) = owner.into_columns();

    let row = sqlx::query_as::<_, CartItemRow>(
        "SELECT id, product_id, variant_id, quantity
         FROM shop.cart_items
         WHERE id = $1
           AND user_id IS NOT DISTINCT FROM $2
           AND guest_token IS NOT DISTINCT FROM $3
         FOR UPDATE",
    )
    .bind(line_id)
    .bind(user_id)
    .bind(guest_token)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(row.map(CartItem::from))
}

/// Insert a new cart line for the owner.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if a line for the same product and
/// variant already exists, `RepositoryError::Database` otherwise.
pub async fn insert_line(
    tx: &mut Transaction<'_, Postgres>,
    owner: CartOwner,
    product_id: ProductId,
    variant_id: Option<VariantId>,
    quantity: i32,
) -> Result<CartItemId, RepositoryError> {
    let (user_id, guest_token) = owner.into_columns();

    let id: i32 = sqlx::query_scalar(
        "INSERT INTO shop.cart_items (user_id, guest_token, product_id, variant_id, quantity)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id",
    )
    .bind(user_id)
    .bind(guest_token)
    .bind(product_id)
    .bind(variant_id)
    .bind(quantity)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return RepositoryError::Conflict(
                "cart already has a line for this product".to_string(),
            );
        }
        RepositoryError::from(e)
    })?;

    Ok(CartItemId::new(id))
}

/// Overwrite a line's quantity.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the line no longer exists,
/// `RepositoryError::Database` otherwise.
pub async fn set_line_quantity(
    tx: &mut Transaction<'_, Postgres>,
    line_id: CartItemId,
    quantity: i32,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        "UPDATE shop.cart_items
         SET quantity = $1, updated_at = now()
         WHERE id = $2",
    )
    .bind(quantity)
    .bind(line_id)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(())
}

/// Delete one of the owner's lines. Returns whether a row was removed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn delete_line(
    pool: &PgPool,
    owner: CartOwner,
    line_id: CartItemId,
) -> Result<bool, RepositoryError> {
    let (user_id, guest_token) = owner.into_columns();

    let result = sqlx::query(
        "DELETE FROM shop.cart_items
         WHERE id = $1
           AND user_id IS NOT DISTINCT FROM $2
           AND guest_token IS NOT DISTINCT FROM $3",
    )
    .bind(line_id)
    .bind(user_id)
    .bind(guest_token)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Remove every line in the owner's cart.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn clear(pool: &PgPool, owner: CartOwner) -> Result<(), RepositoryError> {
    let (user_id, guest_token) = owner.into_columns();

    sqlx::query(
        "DELETE FROM shop.cart_items
         WHERE user_id IS NOT DISTINCT FROM $1
           AND guest_token IS NOT DISTINCT FROM $2",
    )
    .bind(user_id)
    .bind(guest_token)
    .execute(pool)
    .await?;

    Ok(())
}

/// Transaction-scoped variant of [`clear`], used by merge and checkout.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn clear_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    owner: CartOwner,
) -> Result<(), RepositoryError> {
    let (user_id, guest_token) = owner.into_columns();

    sqlx::query(
        "DELETE FROM shop.cart_items
         WHERE user_id IS NOT DISTINCT FROM $1
           AND guest_token IS NOT DISTINCT FROM $2",
    )
    .bind(user_id)
    .bind(guest_token)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// List and lock every raw line in the owner's cart, oldest first.
///
/// Merge and checkout both start here so that two operations over the same
/// cart serialize instead of interleaving.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_items_for_update(
    tx: &mut Transaction<'_, Postgres>,
    owner: CartOwner,
) -> Result<Vec<CartItem>, RepositoryError> {
    let (user_id, guest_token) = owner.into_columns();

    let rows = sqlx::query_as::<_, CartItemRow>(
        "SELECT id, product_id, variant_id, quantity
         FROM shop.cart_items
         WHERE user_id IS NOT DISTINCT FROM $1
           AND guest_token IS NOT DISTINCT FROM $2
         ORDER BY created_at, id
         FOR UPDATE",
    )
    .bind(user_id)
    .bind(guest_token)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows.into_iter().map(CartItem::from).collect())
}

/// Delete a single line inside a transaction, without an owner check.
///
/// Only called with IDs read under lock in the same transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn delete_line_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    line_id: CartItemId,
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM shop.cart_items WHERE id = $1")
        .bind(line_id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}
