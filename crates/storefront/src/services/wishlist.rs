//! Wishlist service.
//!
//! Thin orchestration over the wishlist repository. Shares `CartError` with
//! the cart service because its failure modes are the same and move-to-cart
//! goes through the cart add logic anyway.

use sqlx::PgPool;

use wildbloom_core::{ProductId, UserId, WishlistItemId};

use crate::db::products::ProductRepository;
use crate::db::wishlist as wishlist_db;
use crate::db::RepositoryError;
use crate::models::cart::{CartOwner, WishlistEntry};
use crate::services::cart::{self, CartError};

/// Wishlist service.
pub struct WishlistService<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistService<'a> {
    /// Create a new wishlist service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List the user's saved products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the query fails.
    pub async fn entries(&self, user_id: UserId) -> Result<Vec<WishlistEntry>, CartError> {
        Ok(wishlist_db::list_entries(self.pool, user_id).await?)
    }

    /// Save a product. Returns `false` when it was already saved.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductUnavailable` for unknown or inactive
    /// products, `CartError::Repository` if a query fails.
    pub async fn add(&self, user_id: UserId, product_id: ProductId) -> Result<bool, CartError> {
        let products = ProductRepository::new(self.pool);
        if products.get_active_by_id(product_id).await?.is_none() {
            return Err(CartError::ProductUnavailable);
        }

        Ok(wishlist_db::add(self.pool, user_id, product_id).await?)
    }

    /// Remove a saved product. Removing an absent entry is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the query fails.
    pub async fn remove(&self, user_id: UserId, item_id: WishlistItemId) -> Result<(), CartError> {
        wishlist_db::remove(self.pool, user_id, item_id).await?;
        Ok(())
    }

    /// Whether the user has saved this product. Drives the product page
    /// button state.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the query fails.
    pub async fn contains(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, CartError> {
        Ok(wishlist_db::contains(self.pool, user_id, product_id).await?)
    }

    /// Move a saved product into the cart (quantity 1, base product).
    ///
    /// The cart add and the wishlist removal happen in one transaction, so
    /// the product is never in both lists or neither, and a failed stock
    /// check leaves the wishlist untouched.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if the entry isn't the user's,
    /// plus whatever the cart add itself returns.
    pub async fn move_to_cart(
        &self,
        user_id: UserId,
        item_id: WishlistItemId,
    ) -> Result<(), CartError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let product_id = wishlist_db::get_product_id_for_update(&mut tx, user_id, item_id)
            .await?
            .ok_or(CartError::ItemNotFound)?;

        cart::add_in_tx(&mut tx, CartOwner::User(user_id), product_id, None, 1).await?;
        wishlist_db::remove_in_tx(&mut tx, user_id, item_id).await?;

        tx.commit().await.map_err(RepositoryError::from)?;
        Ok(())
    }
}
