//! Catalog domain types as the admin panel sees them.
//!
//! The admin edits the same `shop` tables the storefront reads, but cares
//! about different things: inactive products stay visible here, and tracked
//! inventory gets a low-stock warning.

use chrono::{DateTime, Utc};

use wildbloom_core::{Money, ProductId, Slug, VariantId};

/// Tracked products at or below this count get flagged on the list page
/// and counted on the dashboard.
pub const LOW_STOCK_THRESHOLD: i32 = 5;

/// A product as managed from the admin panel.
#[derive(Debug, Clone)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// URL slug, unique across the catalog.
    pub slug: Slug,
    /// Display name.
    pub name: String,
    /// Long-form description.
    pub description: String,
    /// Base price; variants may override it.
    pub price: Money,
    /// Units on hand at the product level.
    pub inventory_quantity: i32,
    /// Whether storefront operations enforce quantity checks.
    pub track_inventory: bool,
    /// Inactive products are hidden from the storefront but stay listed here.
    pub active: bool,
    /// Featured products appear on the storefront home page.
    pub featured: bool,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A variant of a product, e.g. a size or scent.
#[derive(Debug, Clone)]
pub struct ProductVariant {
    /// Unique variant ID.
    pub id: VariantId,
    /// Parent product.
    pub product_id: ProductId,
    /// Variant display name, e.g. "100ml".
    pub name: String,
    /// Stock-keeping unit, unique when present.
    pub sku: Option<String>,
    /// Price override; `None` falls back to the product price.
    pub price: Option<Money>,
    /// Inventory override; `None` falls back to the product count.
    pub inventory_quantity: Option<i32>,
    /// Sort position within the product.
    pub position: i32,
    /// When the variant was created.
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Whether the product should carry a low-stock warning.
    ///
    /// Only meaningful for tracked inventory; untracked products never
    /// run out.
    #[must_use]
    pub const fn is_low_stock(&self) -> bool {
        self.track_inventory && self.inventory_quantity <= LOW_STOCK_THRESHOLD
    }
}

impl ProductVariant {
    /// Whether this variant's own inventory count, if it has one, is at or
    /// below the warning threshold.
    #[must_use]
    pub fn is_low_stock(&self) -> bool {
        self.inventory_quantity
            .is_some_and(|quantity| quantity <= LOW_STOCK_THRESHOLD)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(track: bool, quantity: i32) -> Product {
        Product {
            id: ProductId::new(1),
            slug: Slug::parse("rosemary-bar-soap").unwrap(),
            name: "Rosemary Bar Soap".to_string(),
            description: String::new(),
            price: Money::from_cents(900),
            inventory_quantity: quantity,
            track_inventory: track,
            active: true,
            featured: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_low_stock_only_when_tracked() {
        assert!(product(true, 5).is_low_stock());
        assert!(product(true, 0).is_low_stock());
        assert!(!product(true, 6).is_low_stock());
        assert!(!product(false, 0).is_low_stock());
    }

    #[test]
    fn test_variant_low_stock_needs_own_count() {
        let mut variant = ProductVariant {
            id: VariantId::new(3),
            product_id: ProductId::new(1),
            name: "Twin pack".to_string(),
            sku: None,
            price: None,
            inventory_quantity: None,
            position: 0,
            created_at: Utc::now(),
        };

        assert!(!variant.is_low_stock());
        variant.inventory_quantity = Some(2);
        assert!(variant.is_low_stock());
        variant.inventory_quantity = Some(40);
        assert!(!variant.is_low_stock());
    }
}
