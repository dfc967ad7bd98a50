//! Order domain types.
//!
//! Orders snapshot the cart at purchase time: every line carries its own copy
//! of the product name, variant name, SKU, and unit price so later catalog
//! edits never change what a customer sees in their history.

use chrono::{DateTime, Utc};

use wildbloom_core::{Email, Money, OrderId, OrderItemId, OrderStatus, PaymentStatus, ProductId, UserId};

/// A placed order (domain type).
#[derive(Debug, Clone)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Customer who placed the order.
    pub user_id: UserId,
    /// Contact email at purchase time.
    pub email: Email,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Payment status. No gateway is integrated; starts `Pending`.
    pub payment_status: PaymentStatus,
    /// Shipping destination captured at checkout.
    pub shipping: ShippingAddress,
    /// Sum of line totals.
    pub subtotal: Money,
    /// Order total. Equal to the subtotal until shipping/taxes exist.
    pub total: Money,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
    /// When the order was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Customer-facing order number, e.g. `WB-001042`.
    #[must_use]
    pub fn number(&self) -> String {
        format!("WB-{:06}", self.id.as_i32())
    }
}

/// Shipping address captured at checkout.
#[derive(Debug, Clone)]
pub struct ShippingAddress {
    /// Recipient name.
    pub name: String,
    /// Street address.
    pub address1: String,
    /// Apartment, suite, etc.
    pub address2: Option<String>,
    /// City.
    pub city: String,
    /// Postal code.
    pub postal_code: String,
    /// Country.
    pub country: String,
}

/// A single line on an order, snapshotted from the cart.
#[derive(Debug, Clone)]
pub struct OrderItem {
    /// Unique order line ID.
    pub id: OrderItemId,
    /// Parent order.
    pub order_id: OrderId,
    /// Product reference; `None` once the product row is gone.
    pub product_id: Option<ProductId>,
    /// Product name at purchase time.
    pub product_name: String,
    /// Variant name at purchase time, if a variant was chosen.
    pub variant_name: Option<String>,
    /// SKU at purchase time, if the variant had one.
    pub sku: Option<String>,
    /// Unit price at purchase time.
    pub unit_price: Money,
    /// Units purchased.
    pub quantity: i32,
    /// Extended line price.
    pub line_total: Money,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_number_is_zero_padded() {
        let order = Order {
            id: OrderId::new(42),
            user_id: UserId::new(1),
            email: Email::parse("customer@example.com").unwrap(),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            shipping: ShippingAddress {
                name: "A Customer".to_string(),
                address1: "1 Main St".to_string(),
                address2: None,
                city: "Portland".to_string(),
                postal_code: "97201".to_string(),
                country: "US".to_string(),
            },
            subtotal: Money::from_cents(2400),
            total: Money::from_cents(2400),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(order.number(), "WB-000042");
    }
}
