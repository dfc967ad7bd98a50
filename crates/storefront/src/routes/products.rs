//! Product catalog route handlers.
//!
//! Listing and detail pages read through the catalog cache, so a price shown
//! here can lag an admin edit by up to the cache TTL. The add-to-cart path
//! re-reads live rows and is never stale.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use wildbloom_core::Slug;

use crate::error::AppError;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::catalog::{Product, ProductVariant};
use crate::routes::NavView;
use crate::services::{CatalogService, WishlistService};
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// Product display data for listing grids.
#[derive(Clone)]
pub struct ProductCardView {
    pub slug: String,
    pub name: String,
    pub price: String,
    pub sold_out: bool,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            slug: product.slug.to_string(),
            name: product.name.clone(),
            price: product.price.to_string(),
            sold_out: product.available_quantity(None).is_some_and(|n| n <= 0),
        }
    }
}

/// Variant display data for the detail page selector.
pub struct VariantView {
    pub id: i32,
    pub name: String,
    /// Effective price with the variant override applied.
    pub price: String,
    pub sold_out: bool,
}

impl VariantView {
    fn build(product: &Product, variant: &ProductVariant) -> Self {
        Self {
            id: variant.id.as_i32(),
            name: variant.name.clone(),
            price: product.unit_price(Some(variant)).to_string(),
            sold_out: product
                .available_quantity(Some(variant))
                .is_some_and(|n| n <= 0),
        }
    }
}

// =============================================================================
// Catalog Listing
// =============================================================================

/// Query parameters for the catalog listing.
#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    pub page: Option<u32>,
}

/// Catalog listing template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductIndexTemplate {
    pub nav: NavView,
    pub products: Vec<ProductCardView>,
    pub page: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Display the paged catalog listing.
#[instrument(skip(state, session, user))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<ListingQuery>,
) -> Result<ProductIndexTemplate, AppError> {
    let page = query.page.unwrap_or(1).max(1);

    let catalog = CatalogService::new(state.pool(), state.catalog_cache());
    let listing = catalog.page(page).await?;

    let nav = NavView::load(&state, &session, user.as_ref()).await?;

    Ok(ProductIndexTemplate {
        nav,
        products: listing.products.iter().map(ProductCardView::from).collect(),
        page: listing.page,
        total_pages: listing.total_pages(),
        has_next: listing.has_next(),
        has_previous: listing.has_previous(),
    })
}

// =============================================================================
// Product Detail
// =============================================================================

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub nav: NavView,
    pub product_id: i32,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub sold_out: bool,
    pub variants: Vec<VariantView>,
    /// Whether the logged-in user already saved this product.
    pub wishlisted: bool,
    pub logged_in: bool,
}

/// Display a product detail page.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(slug): Path<String>,
) -> Result<ProductShowTemplate, AppError> {
    // An unparseable slug can't match a row, so it reads as a missing page.
    let slug = Slug::parse(&slug).map_err(|_| AppError::NotFound(slug.clone()))?;

    let detail = CatalogService::new(state.pool(), state.catalog_cache())
        .by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(slug.to_string()))?;

    let wishlisted = match &user {
        Some(current) => {
            WishlistService::new(state.pool())
                .contains(current.id, detail.product.id)
                .await?
        }
        None => false,
    };

    let nav = NavView::load(&state, &session, user.as_ref()).await?;

    let product = &detail.product;
    Ok(ProductShowTemplate {
        nav,
        product_id: product.id.as_i32(),
        slug: product.slug.to_string(),
        name: product.name.clone(),
        description: product.description.clone(),
        price: product.price.to_string(),
        sold_out: product.available_quantity(None).is_some_and(|n| n <= 0),
        variants: detail
            .variants
            .iter()
            .map(|variant| VariantView::build(product, variant))
            .collect(),
        wishlisted,
        logged_in: user.is_some(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wildbloom_core::{Money, ProductId, VariantId};

    fn product(track: bool, stock: i32) -> Product {
        Product {
            id: ProductId::new(1),
            slug: Slug::parse("rosehip-face-oil").unwrap(),
            name: "Rosehip Face Oil".to_owned(),
            description: "Cold-pressed.".to_owned(),
            price: Money::from_cents(2400),
            inventory_quantity: stock,
            track_inventory: track,
            active: true,
            featured: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_card_marks_sold_out_only_when_tracked_and_empty() {
        assert!(ProductCardView::from(&product(true, 0)).sold_out);
        assert!(!ProductCardView::from(&product(true, 3)).sold_out);
        // Untracked products never show as sold out.
        assert!(!ProductCardView::from(&product(false, 0)).sold_out);
    }

    #[test]
    fn test_variant_view_applies_price_override() {
        let product = product(true, 10);
        let variant = ProductVariant {
            id: VariantId::new(7),
            product_id: product.id,
            name: "Large".to_owned(),
            sku: Some("RFO-L".to_owned()),
            price: Some(Money::from_cents(3900)),
            inventory_quantity: Some(2),
            position: 1,
            created_at: Utc::now(),
        };

        let view = VariantView::build(&product, &variant);
        assert_eq!(view.price, "$39.00");
        assert!(!view.sold_out);

        let plain = ProductVariant {
            price: None,
            ..variant
        };
        assert_eq!(VariantView::build(&product, &plain).price, "$24.00");
    }
}
