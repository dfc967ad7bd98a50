//! Catalog domain types: products, variants, and availability math.

use chrono::{DateTime, Utc};

use wildbloom_core::{Money, ProductId, Slug, VariantId};

/// A product in the catalog (domain type).
#[derive(Debug, Clone)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// URL slug, unique across the catalog.
    pub slug: Slug,
    /// Display name.
    pub name: String,
    /// Long-form description, rendered as plain text.
    pub description: String,
    /// Base price; variants may override it.
    pub price: Money,
    /// Units on hand at the product level.
    pub inventory_quantity: i32,
    /// Whether add-to-cart operations enforce quantity checks.
    pub track_inventory: bool,
    /// Inactive products are hidden from the storefront.
    pub active: bool,
    /// Featured products appear on the home page.
    pub featured: bool,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A purchasable variant of a product, e.g. a size or scent.
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
    /// Units available for purchase, or `None` when inventory is untracked.
    ///
    /// A variant's inventory count, when it has one, overrides the parent
    /// product's count.
    #[must_use]
    pub fn available_quantity(&self, variant: Option<&ProductVariant>) -> Option<i32> {
        if !self.track_inventory {
            return None;
        }
        let quantity = variant
            .and_then(|v| v.inventory_quantity)
            .unwrap_or(self.inventory_quantity);
        Some(quantity.max(0))
    }

    /// Unit price for a selection: the variant override when set, else the
    /// product price.
    #[must_use]
    pub fn unit_price(&self, variant: Option<&ProductVariant>) -> Money {
        variant.and_then(|v| v.price).unwrap_or(self.price)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(track: bool, quantity: i32) -> Product {
        Product {
            id: ProductId::new(1),
            slug: Slug::parse("lavender-hand-balm").unwrap(),
            name: "Lavender Hand Balm".to_string(),
            description: String::new(),
            price: Money::from_cents(1800),
            inventory_quantity: quantity,
            track_inventory: track,
            active: true,
            featured: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn variant(price_cents: Option<i64>, quantity: Option<i32>) -> ProductVariant {
        ProductVariant {
            id: VariantId::new(10),
            product_id: ProductId::new(1),
            name: "100ml".to_string(),
            sku: None,
            price: price_cents.map(Money::from_cents),
            inventory_quantity: quantity,
            position: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_untracked_product_is_unlimited() {
        let p = product(false, 0);
        assert_eq!(p.available_quantity(None), None);
        assert_eq!(p.available_quantity(Some(&variant(None, Some(3)))), None);
    }

    #[test]
    fn test_tracked_product_uses_product_count() {
        let p = product(true, 7);
        assert_eq!(p.available_quantity(None), Some(7));
    }

    #[test]
    fn test_variant_inventory_overrides_product() {
        let p = product(true, 7);
        assert_eq!(p.available_quantity(Some(&variant(None, Some(2)))), Some(2));
        // Variant with no count of its own falls back to the product
        assert_eq!(p.available_quantity(Some(&variant(None, None))), Some(7));
    }

    #[test]
    fn test_negative_inventory_clamps_to_zero() {
        let p = product(true, -3);
        assert_eq!(p.available_quantity(None), Some(0));
        assert_eq!(
            p.available_quantity(Some(&variant(None, Some(-1)))),
            Some(0)
        );
    }

    #[test]
    fn test_unit_price_override() {
        let p = product(true, 5);
        assert_eq!(p.unit_price(None), Money::from_cents(1800));
        assert_eq!(
            p.unit_price(Some(&variant(Some(2400), None))),
            Money::from_cents(2400)
        );
        assert_eq!(
            p.unit_price(Some(&variant(None, None))),
            Money::from_cents(1800)
        );
    }
}
