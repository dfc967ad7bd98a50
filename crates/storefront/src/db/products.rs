//! Catalog repository: product and variant reads.
//!
//! The storefront only ever sees active products. Inventory writes happen
//! here too, but always inside a caller-owned transaction with the catalog
//! rows locked (cart add and checkout both go through [`lock_product`]).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use wildbloom_core::{Money, ProductId, Slug, VariantId};

use super::RepositoryError;
use crate::models::catalog::{Product, ProductVariant};

/// Database row for a product.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    slug: String,
    name: String,
    description: String,
    price: Decimal,
    inventory_quantity: i32,
    track_inventory: bool,
    active: bool,
    featured: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let slug = Slug::parse(&row.slug).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid slug in database: {e}"))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            slug,
            name: row.name,
            description: row.description,
            price: Money::from_decimal(row.price),
            inventory_quantity: row.inventory_quantity,
            track_inventory: row.track_inventory,
            active: row.active,
            featured: row.featured,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Database row for a product variant.
#[derive(Debug, sqlx::FromRow)]
struct VariantRow {
    id: i32,
    product_id: i32,
    name: String,
    sku: Option<String>,
    price: Option<Decimal>,
    inventory_quantity: Option<i32>,
    position: i32,
    created_at: DateTime<Utc>,
}

impl From<VariantRow> for ProductVariant {
    fn from(row: VariantRow) -> Self {
        Self {
            id: VariantId::new(row.id),
            product_id: ProductId::new(row.product_id),
            name: row.name,
            sku: row.sku,
            price: row.price.map(Money::from_decimal),
            inventory_quantity: row.inventory_quantity,
            position: row.position,
            created_at: row.created_at,
        }
    }
}

/// Repository for storefront catalog reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Count active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_active(&self) -> Result<i64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM shop.products WHERE active")
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }

    /// List a page of active products, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored slug is invalid.
    pub async fn list_active(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, slug, name, description, price, inventory_quantity,
                    track_inventory, active, featured, created_at, updated_at
             FROM shop.products
             WHERE active
             ORDER BY name, id
             LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// List featured active products for the home page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored slug is invalid.
    pub async fn list_featured(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, slug, name, description, price, inventory_quantity,
                    track_inventory, active, featured, created_at, updated_at
             FROM shop.products
             WHERE active AND featured
             ORDER BY updated_at DESC, id
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Get an active product by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored slug is invalid.
    pub async fn get_active_by_slug(&self, slug: &Slug) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, slug, name, description, price, inventory_quantity,
                    track_inventory, active, featured, created_at, updated_at
             FROM shop.products
             WHERE slug = $1 AND active",
        )
        .bind(slug.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Get an active product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored slug is invalid.
    pub async fn get_active_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, slug, name, description, price, inventory_quantity,
                    track_inventory, active, featured, created_at, updated_at
             FROM shop.products
             WHERE id = $1 AND active",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// List a product's variants in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_variants(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductVariant>, RepositoryError> {
        let rows = sqlx::query_as::<_, VariantRow>(
            "SELECT id, product_id, name, sku, price, inventory_quantity, position, created_at
             FROM shop.product_variants
             WHERE product_id = $1
             ORDER BY position, id",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductVariant::from).collect())
    }
}

/// Lock an active product row for the duration of a transaction.
///
/// Returns `None` when the product doesn't exist or is inactive.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if the stored slug is invalid.
pub async fn lock_product(
    tx: &mut Transaction<'_, Postgres>,
    product_id: ProductId,
) -> Result<Option<Product>, RepositoryError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT id, slug, name, description, price, inventory_quantity,
                track_inventory, active, featured, created_at, updated_at
         FROM shop.products
         WHERE id = $1 AND active
         FOR UPDATE",
    )
    .bind(product_id)
    .fetch_optional(&mut **tx)
    .await?;

    row.map(Product::try_from).transpose()
}

/// Lock a variant row belonging to a product for the duration of a transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_variant(
    tx: &mut Transaction<'_, Postgres>,
    variant_id: VariantId,
    product_id: ProductId,
) -> Result<Option<ProductVariant>, RepositoryError> {
    let row = sqlx::query_as::<_, VariantRow>(
        "SELECT id, product_id, name, sku, price, inventory_quantity, position, created_at
         FROM shop.product_variants
         WHERE id = $1 AND product_id = $2
         FOR UPDATE",
    )
    .bind(variant_id)
    .bind(product_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(row.map(ProductVariant::from))
}

/// Decrement product-level inventory. Caller must hold the row lock.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn decrement_product_inventory(
    tx: &mut Transaction<'_, Postgres>,
    product_id: ProductId,
    quantity: i32,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE shop.products
         SET inventory_quantity = inventory_quantity - $1, updated_at = now()
         WHERE id = $2",
    )
    .bind(quantity)
    .bind(product_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Decrement variant-level inventory. Caller must hold the row lock.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn decrement_variant_inventory(
    tx: &mut Transaction<'_, Postgres>,
    variant_id: VariantId,
    quantity: i32,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE shop.product_variants
         SET inventory_quantity = inventory_quantity - $1
         WHERE id = $2",
    )
    .bind(quantity)
    .bind(variant_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
