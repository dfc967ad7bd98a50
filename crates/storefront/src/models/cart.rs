//! Cart and wishlist domain types.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use wildbloom_core::{CartItemId, Money, ProductId, Slug, UserId, VariantId, WishlistItemId};

/// Who a cart belongs to.
///
/// A cart row is owned by exactly one identity: an authenticated user or an
/// anonymous session's guest token. The two are mutually exclusive, enforced
/// here by construction and in the database by a CHECK constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOwner {
    /// Authenticated user.
    User(UserId),
    /// Anonymous session, identified by the guest token minted into it.
    Guest(Uuid),
}

impl CartOwner {
    /// Split into the `(user_id, guest_token)` pair bound into queries.
    /// Exactly one side is `Some`.
    #[must_use]
    pub const fn into_columns(self) -> (Option<UserId>, Option<Uuid>) {
        match self {
            Self::User(id) => (Some(id), None),
            Self::Guest(token) => (None, Some(token)),
        }
    }
}

/// A cart line joined with live catalog data for display and totals.
#[derive(Debug, Clone)]
pub struct CartLine {
    /// Cart row ID.
    pub id: CartItemId,
    /// Product in the line.
    pub product_id: ProductId,
    /// Product slug for linking back to the detail page.
    pub product_slug: Slug,
    /// Product display name.
    pub product_name: String,
    /// Selected variant, if any.
    pub variant_id: Option<VariantId>,
    /// Variant display name, if any.
    pub variant_name: Option<String>,
    /// Units in the line.
    pub quantity: i32,
    /// Unit price (variant override applied).
    pub unit_price: Money,
    /// Units available, or `None` when inventory is untracked.
    pub available: Option<i32>,
    /// When the line was last changed.
    pub updated_at: DateTime<Utc>,
}

impl CartLine {
    /// Extended price for the line.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity.unsigned_abs())
    }
}

/// Cart totals computed over the lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartTotals {
    /// Total units across all lines.
    pub item_count: i64,
    /// Sum of line totals.
    pub subtotal: Money,
}

/// Compute totals for a set of cart lines.
#[must_use]
pub fn compute_totals(lines: &[CartLine]) -> CartTotals {
    CartTotals {
        item_count: lines.iter().map(|l| i64::from(l.quantity)).sum(),
        subtotal: lines.iter().map(CartLine::line_total).sum(),
    }
}

/// A wishlist entry joined with live catalog data.
#[derive(Debug, Clone)]
pub struct WishlistEntry {
    /// Wishlist row ID.
    pub id: WishlistItemId,
    /// Saved product.
    pub product_id: ProductId,
    /// Product slug for linking.
    pub product_slug: Slug,
    /// Product display name.
    pub product_name: String,
    /// Current product price.
    pub price: Money,
    /// Whether the product can currently be added to the cart.
    pub in_stock: bool,
    /// When the product was saved.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(quantity: i32, unit_cents: i64) -> CartLine {
        CartLine {
            id: CartItemId::new(1),
            product_id: ProductId::new(1),
            product_slug: Slug::parse("calendula-salve").unwrap(),
            product_name: "Calendula Salve".to_string(),
            variant_id: None,
            variant_name: None,
            quantity,
            unit_price: Money::from_cents(unit_cents),
            available: Some(10),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_columns_are_exclusive() {
        let (user, guest) = CartOwner::User(UserId::new(3)).into_columns();
        assert_eq!(user, Some(UserId::new(3)));
        assert!(guest.is_none());

        let token = Uuid::new_v4();
        let (user, guest) = CartOwner::Guest(token).into_columns();
        assert!(user.is_none());
        assert_eq!(guest, Some(token));
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line(3, 1250).line_total(), Money::from_cents(3750));
    }

    #[test]
    fn test_compute_totals() {
        let totals = compute_totals(&[line(2, 1000), line(1, 450)]);
        assert_eq!(totals.item_count, 3);
        assert_eq!(totals.subtotal, Money::from_cents(2450));
    }

    #[test]
    fn test_compute_totals_empty() {
        let totals = compute_totals(&[]);
        assert_eq!(totals.item_count, 0);
        assert_eq!(totals.subtotal, Money::ZERO);
    }
}
