//! Cart service.
//!
//! Every mutation that depends on stock runs in a transaction that locks the
//! cart line(s) first and the product rows second. Checkout acquires its
//! locks in the same order, so concurrent mutations serialize instead of
//! deadlocking, and the availability check can't race a checkout. Reads go
//! straight to the pool.

use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use wildbloom_core::{CartItemId, ProductId, UserId, VariantId};

use crate::db::cart as cart_db;
use crate::db::products as product_db;
use crate::db::RepositoryError;
use crate::models::cart::{CartLine, CartOwner, CartTotals, compute_totals};
use crate::models::catalog::{Product, ProductVariant};

/// Hard per-line quantity cap, independent of stock.
pub const MAX_LINE_QUANTITY: i32 = 99;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Requested quantity exceeds what's in stock.
    #[error("Only {available} left in stock")]
    InsufficientStock { available: i32 },

    /// Quantity outside the accepted range.
    #[error("Quantity must be between 1 and {max}")]
    InvalidQuantity { max: i32 },

    /// Product doesn't exist, is inactive, or the variant doesn't belong
    /// to it.
    #[error("This product is no longer available")]
    ProductUnavailable,

    /// Cart line doesn't exist or belongs to someone else.
    #[error("Cart item not found")]
    ItemNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Cart service.
pub struct CartService<'a> {
    pool: &'a PgPool,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List the owner's cart lines with live catalog data.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the query fails.
    pub async fn lines(&self, owner: CartOwner) -> Result<Vec<CartLine>, CartError> {
        Ok(cart_db::list_lines(self.pool, owner).await?)
    }

    /// Cart lines plus computed totals, for the cart page.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the query fails.
    pub async fn lines_with_totals(
        &self,
        owner: CartOwner,
    ) -> Result<(Vec<CartLine>, CartTotals), CartError> {
        let lines = cart_db::list_lines(self.pool, owner).await?;
        let totals = compute_totals(&lines);
        Ok((lines, totals))
    }

    /// Total item count for the header badge.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the query fails.
    pub async fn count(&self, owner: CartOwner) -> Result<i64, CartError> {
        Ok(cart_db::count_items(self.pool, owner).await?)
    }

    /// Add a product (optionally a specific variant) to the cart.
    ///
    /// Adding a product already in the cart sums into the existing line.
    /// The post-add quantity must stay within `1..=MAX_LINE_QUANTITY` and,
    /// for tracked products, within available stock.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for out-of-range quantities,
    /// `CartError::ProductUnavailable` for unknown or inactive products,
    /// `CartError::InsufficientStock` when stock can't cover the new total.
    pub async fn add(
        &self,
        owner: CartOwner,
        product_id: ProductId,
        variant_id: Option<VariantId>,
        quantity: i32,
    ) -> Result<(), CartError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        add_in_tx(&mut tx, owner, product_id, variant_id, quantity).await?;
        tx.commit().await.map_err(RepositoryError::from)?;
        Ok(())
    }

    /// Set an existing line to an exact quantity.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if the line isn't the owner's,
    /// plus the same quantity/stock errors as [`add`](Self::add).
    pub async fn update_quantity(
        &self,
        owner: CartOwner,
        line_id: CartItemId,
        quantity: i32,
    ) -> Result<(), CartError> {
        validate_quantity(quantity)?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let line = cart_db::get_line(&mut tx, owner, line_id)
            .await?
            .ok_or(CartError::ItemNotFound)?;

        let (product, variant) = lock_catalog(&mut tx, line.product_id, line.variant_id).await?;
        check_stock(&product, variant.as_ref(), quantity)?;

        cart_db::set_line_quantity(&mut tx, line_id, quantity).await?;

        tx.commit().await.map_err(RepositoryError::from)?;
        Ok(())
    }

    /// Remove a line. Removing a line that's already gone is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the query fails.
    pub async fn remove(&self, owner: CartOwner, line_id: CartItemId) -> Result<(), CartError> {
        cart_db::delete_line(self.pool, owner, line_id).await?;
        Ok(())
    }

    /// Empty the owner's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the query fails.
    pub async fn clear(&self, owner: CartOwner) -> Result<(), CartError> {
        Ok(cart_db::clear(self.pool, owner).await?)
    }

    /// Fold a guest cart into a user's cart after login.
    ///
    /// Quantities sum per (product, variant) and clamp to the line cap and
    /// to available stock instead of failing; a merge at login must never
    /// block the login. Lines for products that have since disappeared are
    /// dropped. An existing user line is never shrunk.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if a query fails.
    pub async fn merge_guest_into_user(
        &self,
        guest_token: Uuid,
        user_id: UserId,
    ) -> Result<(), CartError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let guest = CartOwner::Guest(guest_token);
        let user = CartOwner::User(user_id);

        let guest_items = cart_db::list_items_for_update(&mut tx, guest).await?;

        for item in guest_items {
            let Some(product) = product_db::lock_product(&mut tx, item.product_id).await? else {
                cart_db::delete_line_in_tx(&mut tx, item.id).await?;
                continue;
            };

            let variant = match item.variant_id {
                Some(variant_id) => {
                    match product_db::lock_variant(&mut tx, variant_id, item.product_id).await? {
                        Some(v) => Some(v),
                        None => {
                            cart_db::delete_line_in_tx(&mut tx, item.id).await?;
                            continue;
                        }
                    }
                }
                None => None,
            };

            let user_line =
                cart_db::find_line(&mut tx, user, item.product_id, item.variant_id).await?;
            let current = user_line.map_or(0, |line| line.quantity);

            let mut target = (current + item.quantity).min(MAX_LINE_QUANTITY);
            if let Some(available) = product.available_quantity(variant.as_ref()) {
                target = target.min(available);
            }
            target = target.max(current);

            match user_line {
                Some(line) => {
                    if target > line.quantity {
                        cart_db::set_line_quantity(&mut tx, line.id, target).await?;
                    }
                }
                None => {
                    if target >= 1 {
                        cart_db::insert_line(&mut tx, user, item.product_id, item.variant_id, target)
                            .await?;
                    }
                }
            }

            cart_db::delete_line_in_tx(&mut tx, item.id).await?;
        }

        tx.commit().await.map_err(RepositoryError::from)?;
        Ok(())
    }
}

/// Add to the cart inside a caller-owned transaction, so a caller can make
/// the add part of a larger atomic step (move-to-cart does).
///
/// Locks the cart line before the product, the same order every other cart
/// writer uses.
///
/// # Errors
///
/// Same as [`CartService::add`].
pub(crate) async fn add_in_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    owner: CartOwner,
    product_id: ProductId,
    variant_id: Option<VariantId>,
    quantity: i32,
) -> Result<(), CartError> {
    validate_quantity(quantity)?;

    let existing = cart_db::find_line(tx, owner, product_id, variant_id).await?;
    let (product, variant) = lock_catalog(tx, product_id, variant_id).await?;

    let new_quantity = existing.map_or(0, |line| line.quantity) + quantity;

    if new_quantity > MAX_LINE_QUANTITY {
        return Err(CartError::InvalidQuantity {
            max: MAX_LINE_QUANTITY,
        });
    }

    check_stock(&product, variant.as_ref(), new_quantity)?;

    match existing {
        Some(line) => cart_db::set_line_quantity(tx, line.id, new_quantity).await?,
        None => {
            cart_db::insert_line(tx, owner, product_id, variant_id, new_quantity).await?;
        }
    }

    Ok(())
}

/// Lock the product (and variant, when given) for the rest of the
/// transaction, verifying both exist and the product is active.
async fn lock_catalog(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    product_id: ProductId,
    variant_id: Option<VariantId>,
) -> Result<(Product, Option<ProductVariant>), CartError> {
    let product = product_db::lock_product(tx, product_id)
        .await?
        .ok_or(CartError::ProductUnavailable)?;

    let variant = match variant_id {
        Some(variant_id) => Some(
            product_db::lock_variant(tx, variant_id, product_id)
                .await?
                .ok_or(CartError::ProductUnavailable)?,
        ),
        None => None,
    };

    Ok((product, variant))
}

fn validate_quantity(quantity: i32) -> Result<(), CartError> {
    if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
        return Err(CartError::InvalidQuantity {
            max: MAX_LINE_QUANTITY,
        });
    }
    Ok(())
}

fn check_stock(
    product: &Product,
    variant: Option<&ProductVariant>,
    quantity: i32,
) -> Result<(), CartError> {
    if let Some(available) = product.available_quantity(variant)
        && quantity > available
    {
        return Err(CartError::InsufficientStock { available });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wildbloom_core::{Money, Slug};

    fn product(track: bool, stock: i32) -> Product {
        Product {
            id: ProductId::new(1),
            slug: Slug::parse("calendula-salve").unwrap(),
            name: "Calendula Salve".to_owned(),
            description: String::new(),
            price: Money::from_cents(1850),
            inventory_quantity: stock,
            track_inventory: track,
            active: true,
            featured: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_validate_quantity_bounds() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(matches!(
            validate_quantity(0),
            Err(CartError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            validate_quantity(-3),
            Err(CartError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            validate_quantity(MAX_LINE_QUANTITY + 1),
            Err(CartError::InvalidQuantity { .. })
        ));
    }

    #[test]
    fn test_check_stock_untracked_always_passes() {
        let product = product(false, 0);
        assert!(check_stock(&product, None, MAX_LINE_QUANTITY).is_ok());
    }

    #[test]
    fn test_check_stock_tracked() {
        let product = product(true, 5);
        assert!(check_stock(&product, None, 5).is_ok());
        assert!(matches!(
            check_stock(&product, None, 6),
            Err(CartError::InsufficientStock { available: 5 })
        ));
    }

    #[test]
    fn test_insufficient_stock_message_names_the_count() {
        let err = CartError::InsufficientStock { available: 2 };
        assert_eq!(err.to_string(), "Only 2 left in stock");
    }
}
