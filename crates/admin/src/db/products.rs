//! Catalog management repository.
//!
//! Unlike the storefront's read paths, these queries see inactive products.
//! Deleting a product from the panel only clears `active`; the row has to
//! outlive its order snapshots and can be reactivated later.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use wildbloom_core::{Money, ProductId, Slug, VariantId};

use super::RepositoryError;
use crate::models::catalog::{LOW_STOCK_THRESHOLD, Product, ProductVariant};

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

/// Validated field set for creating or updating a product.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub slug: Slug,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub inventory_quantity: i32,
    pub track_inventory: bool,
    pub active: bool,
    pub featured: bool,
}

/// Validated field set for adding a variant.
#[derive(Debug, Clone)]
pub struct VariantInput {
    pub name: String,
    pub sku: Option<String>,
    pub price: Option<Money>,
    pub inventory_quantity: Option<i32>,
    pub position: i32,
}

/// Repository for catalog management.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List every product, active or not, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored slug is invalid.
    pub async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, slug, name, description, price, inventory_quantity,
                    track_inventory, active, featured, created_at, updated_at
             FROM shop.products
             ORDER BY name, id",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Get a product by ID, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored slug is invalid.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, slug, name, description, price, inventory_quantity,
                    track_inventory, active, featured, created_at, updated_at
             FROM shop.products
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is already taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "INSERT INTO shop.products
                 (slug, name, description, price, inventory_quantity,
                  track_inventory, active, featured)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id, slug, name, description, price, inventory_quantity,
                       track_inventory, active, featured, created_at, updated_at",
        )
        .bind(input.slug.as_str())
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.inventory_quantity)
        .bind(input.track_inventory)
        .bind(input.active)
        .bind(input.featured)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("slug already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.try_into()
    }

    /// Replace a product's editable fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new slug is already taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "UPDATE shop.products
             SET slug = $1, name = $2, description = $3, price = $4,
                 inventory_quantity = $5, track_inventory = $6, active = $7,
                 featured = $8, updated_at = now()
             WHERE id = $9
             RETURNING id, slug, name, description, price, inventory_quantity,
                       track_inventory, active, featured, created_at, updated_at",
        )
        .bind(input.slug.as_str())
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.inventory_quantity)
        .bind(input.track_inventory)
        .bind(input.active)
        .bind(input.featured)
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("slug already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Soft-delete a product by clearing its `active` flag.
    ///
    /// The row stays behind order snapshots and cart references; the
    /// storefront stops showing it immediately.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn deactivate(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.products SET active = FALSE, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
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

    /// Add a variant to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the SKU is already taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn add_variant(
        &self,
        product_id: ProductId,
        input: &VariantInput,
    ) -> Result<ProductVariant, RepositoryError> {
        let row = sqlx::query_as::<_, VariantRow>(
            "INSERT INTO shop.product_variants
                 (product_id, name, sku, price, inventory_quantity, position)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, product_id, name, sku, price, inventory_quantity, position, created_at",
        )
        .bind(product_id)
        .bind(&input.name)
        .bind(&input.sku)
        .bind(input.price)
        .bind(input.inventory_quantity)
        .bind(input.position)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("sku already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(row.into())
    }

    /// Delete a variant, verifying it belongs to the product first.
    ///
    /// Cart rows referencing the variant cascade away; order snapshots keep
    /// their copied variant name and SKU.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the variant doesn't exist or
    /// belongs to another product.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete_variant(
        &self,
        variant_id: VariantId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM shop.product_variants WHERE id = $1 AND product_id = $2")
                .bind(variant_id)
                .bind(product_id)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Count active tracked products at or below the low-stock threshold.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_low_stock(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM shop.products
             WHERE active AND track_inventory AND inventory_quantity <= $1",
        )
        .bind(LOW_STOCK_THRESHOLD)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }
}
