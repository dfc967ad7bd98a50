//! Wishlist persistence. Wishlists belong to registered users only.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use wildbloom_core::{Money, ProductId, Slug, UserId, WishlistItemId};

use super::RepositoryError;
use crate::models::cart::WishlistEntry;

#[derive(Debug, sqlx::FromRow)]
struct WishlistEntryRow {
    id: i32,
    product_id: i32,
    product_slug: String,
    product_name: String,
    price: Decimal,
    in_stock: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<WishlistEntryRow> for WishlistEntry {
    type Error = RepositoryError;

    fn try_from(row: WishlistEntryRow) -> Result<Self, Self::Error> {
        let product_slug = Slug::parse(&row.product_slug).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid slug in database: {e}"))
        })?;

        Ok(Self {
            id: WishlistItemId::new(row.id),
            product_id: ProductId::new(row.product_id),
            product_slug,
            product_name: row.product_name,
            price: Money::from_decimal(row.price),
            in_stock: row.in_stock,
            created_at: row.created_at,
        })
    }
}

/// Add a product to the user's wishlist. Returns `false` when it was
/// already there.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn add(
    pool: &PgPool,
    user_id: UserId,
    product_id: ProductId,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        "INSERT INTO shop.wishlist_items (user_id, product_id)
         VALUES ($1, $2)
         ON CONFLICT (user_id, product_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(product_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Remove a wishlist entry the user owns. Returns whether a row was removed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn remove(
    pool: &PgPool,
    user_id: UserId,
    item_id: WishlistItemId,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        "DELETE FROM shop.wishlist_items
         WHERE id = $1 AND user_id = $2",
    )
    .bind(item_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// List the user's wishlist joined with live catalog data, newest first.
///
/// Entries for deactivated products drop out of the join.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if a stored slug is invalid.
pub async fn list_entries(
    pool: &PgPool,
    user_id: UserId,
) -> Result<Vec<WishlistEntry>, RepositoryError> {
    let rows = sqlx::query_as::<_, WishlistEntryRow>(
        "SELECT wi.id, wi.product_id, p.slug AS product_slug, p.name AS product_name,
                p.price,
                (NOT p.track_inventory
                 OR p.inventory_quantity > 0
                 OR EXISTS (
                     SELECT 1 FROM shop.product_variants v
                     WHERE v.product_id = p.id AND v.inventory_quantity > 0
                 )) AS in_stock,
                wi.created_at
         FROM shop.wishlist_items wi
         JOIN shop.products p ON p.id = wi.product_id AND p.active
         WHERE wi.user_id = $1
         ORDER BY wi.created_at DESC, wi.id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(WishlistEntry::try_from).collect()
}

/// Resolve a wishlist entry to its product and lock the entry for the rest
/// of the transaction, for move-to-cart. A concurrent move of the same
/// entry blocks here and sees no row once the first one commits.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_product_id_for_update(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
    item_id: WishlistItemId,
) -> Result<Option<ProductId>, RepositoryError> {
    let product_id: Option<i32> = sqlx::query_scalar(
        "SELECT product_id
         FROM shop.wishlist_items
         WHERE id = $1 AND user_id = $2
         FOR UPDATE",
    )
    .bind(item_id)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(product_id.map(ProductId::new))
}

/// Remove a wishlist entry inside a caller-owned transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn remove_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
    item_id: WishlistItemId,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        "DELETE FROM shop.wishlist_items
         WHERE id = $1 AND user_id = $2",
    )
    .bind(item_id)
    .bind(user_id)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Whether the user has already saved this product.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn contains(
    pool: &PgPool,
    user_id: UserId,
    product_id: ProductId,
) -> Result<bool, RepositoryError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
             SELECT 1 FROM shop.wishlist_items
             WHERE user_id = $1 AND product_id = $2
         )",
    )
    .bind(user_id)
    .bind(product_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}
