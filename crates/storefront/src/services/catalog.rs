//! Cached catalog reads.
//!
//! Product listings and detail pages are read-heavy and written only by the
//! admin process, so they are cached in-process with `moka` (60-second TTL).
//! Admin edits therefore reach shoppers within a minute; cart and checkout
//! always read live rows under lock and never see this cache.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use wildbloom_core::Slug;

use crate::db::RepositoryError;
use crate::db::products::ProductRepository;
use crate::models::catalog::{Product, ProductVariant};

/// Products shown per catalog page.
pub const PAGE_SIZE: i64 = 12;

/// Featured products shown on the home page.
const FEATURED_LIMIT: i64 = 8;

const CACHE_TTL_SECONDS: u64 = 60;
const CACHE_CAPACITY: u64 = 1000;

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Featured,
    Page(u32),
    Detail(String),
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Featured(Arc<Vec<Product>>),
    Page(Arc<CatalogPage>),
    Detail(Arc<ProductDetail>),
}

/// One page of the catalog listing.
#[derive(Debug)]
pub struct CatalogPage {
    /// Products on this page, ordered by name.
    pub products: Vec<Product>,
    /// Total active products across all pages.
    pub total: i64,
    /// 1-based page number.
    pub page: u32,
}

impl CatalogPage {
    /// Number of pages in the catalog, at least 1.
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        let pages = self.total.div_euclid(PAGE_SIZE) + i64::from(self.total % PAGE_SIZE != 0);
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }

    /// Whether a later page exists.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Whether an earlier page exists.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// A product with its variants, as rendered on the detail page.
#[derive(Debug)]
pub struct ProductDetail {
    pub product: Product,
    pub variants: Vec<ProductVariant>,
}

/// Shared in-process cache for catalog reads.
///
/// Lives in application state; one per process.
#[derive(Clone)]
pub struct CatalogCache {
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogCache {
    /// Create an empty cache with the standard TTL.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(Duration::from_secs(CACHE_TTL_SECONDS))
                .build(),
        }
    }
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Catalog read service backed by the shared cache.
pub struct CatalogService<'a> {
    pool: &'a PgPool,
    cache: &'a CatalogCache,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, cache: &'a CatalogCache) -> Self {
        Self { pool, cache }
    }

    /// Featured products for the home page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog cannot be read.
    pub async fn featured(&self) -> Result<Arc<Vec<Product>>, RepositoryError> {
        if let Some(CacheValue::Featured(products)) = self.cache.cache.get(&CacheKey::Featured).await
        {
            return Ok(products);
        }

        let products = Arc::new(
            ProductRepository::new(self.pool)
                .list_featured(FEATURED_LIMIT)
                .await?,
        );
        self.cache
            .cache
            .insert(CacheKey::Featured, CacheValue::Featured(Arc::clone(&products)))
            .await;
        Ok(products)
    }

    /// One page of the catalog listing. `page` is 1-based; values below 1
    /// are treated as 1.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog cannot be read.
    pub async fn page(&self, page: u32) -> Result<Arc<CatalogPage>, RepositoryError> {
        let page = page.max(1);
        if let Some(CacheValue::Page(cached)) = self.cache.cache.get(&CacheKey::Page(page)).await {
            return Ok(cached);
        }

        let repo = ProductRepository::new(self.pool);
        let offset = i64::from(page - 1) * PAGE_SIZE;
        let products = repo.list_active(PAGE_SIZE, offset).await?;
        let total = repo.count_active().await?;

        let result = Arc::new(CatalogPage {
            products,
            total,
            page,
        });
        self.cache
            .cache
            .insert(CacheKey::Page(page), CacheValue::Page(Arc::clone(&result)))
            .await;
        Ok(result)
    }

    /// A product and its variants by slug, or `None` when the slug doesn't
    /// match an active product. Misses are not cached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog cannot be read.
    pub async fn by_slug(&self, slug: &Slug) -> Result<Option<Arc<ProductDetail>>, RepositoryError> {
        let key = CacheKey::Detail(slug.as_str().to_owned());
        if let Some(CacheValue::Detail(cached)) = self.cache.cache.get(&key).await {
            return Ok(Some(cached));
        }

        let repo = ProductRepository::new(self.pool);
        let Some(product) = repo.get_active_by_slug(slug).await? else {
            return Ok(None);
        };
        let variants = repo.list_variants(product.id).await?;

        let detail = Arc::new(ProductDetail { product, variants });
        self.cache
            .cache
            .insert(key, CacheValue::Detail(Arc::clone(&detail)))
            .await;
        Ok(Some(detail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_of(total: i64, page: u32) -> CatalogPage {
        CatalogPage {
            products: Vec::new(),
            total,
            page,
        }
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(page_of(0, 1).total_pages(), 1);
        assert_eq!(page_of(12, 1).total_pages(), 1);
        assert_eq!(page_of(13, 1).total_pages(), 2);
        assert_eq!(page_of(24, 1).total_pages(), 2);
        assert_eq!(page_of(25, 1).total_pages(), 3);
    }

    #[test]
    fn test_page_navigation_flags() {
        let first = page_of(30, 1);
        assert!(!first.has_previous());
        assert!(first.has_next());

        let last = page_of(30, 3);
        assert!(last.has_previous());
        assert!(!last.has_next());
    }
}
