//! Checkout service.
//!
//! Order placement is one transaction: lock the cart rows, lock each
//! product, re-check stock, snapshot prices and names into order items,
//! decrement tracked inventory, insert the order, clear the cart. Any
//! failure rolls the whole thing back, so inventory never moves without a
//! matching order.

use sqlx::PgPool;
use thiserror::Error;

use wildbloom_core::{Money, OrderId, UserId};

use crate::db::cart as cart_db;
use crate::db::orders as order_db;
use crate::db::products as product_db;
use crate::db::RepositoryError;
use crate::db::orders::NewOrderItem;
use crate::models::cart::CartOwner;
use crate::models::order::ShippingAddress;
use crate::security::sanitize;

const MAX_NAME_LENGTH: usize = 100;
const MAX_ADDRESS_LENGTH: usize = 200;
const MAX_CITY_LENGTH: usize = 100;
const MAX_POSTAL_CODE_LENGTH: usize = 20;
const MAX_COUNTRY_LENGTH: usize = 60;

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to order.
    #[error("Your cart is empty")]
    EmptyCart,

    /// A shipping field failed validation. The message is shown to the user.
    #[error("{0}")]
    InvalidAddress(String),

    /// Stock ran out between cart and checkout.
    #[error("{name}: only {available} left in stock")]
    OutOfStock { name: String, available: i32 },

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Raw shipping fields from the checkout form.
#[derive(Debug, Clone, Default)]
pub struct ShippingInput {
    pub name: String,
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// Checkout service.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order from the user's cart.
    ///
    /// Cart lines for products that disappeared since they were added are
    /// dropped silently, matching how the cart page stops showing them. If
    /// nothing orderable remains, the cart is empty.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidAddress` for bad shipping fields,
    /// `CheckoutError::EmptyCart` when there's nothing to order, and
    /// `CheckoutError::OutOfStock` when stock no longer covers a line.
    pub async fn place_order(
        &self,
        user_id: UserId,
        email: &str,
        shipping: &ShippingInput,
    ) -> Result<OrderId, CheckoutError> {
        let address = validate_shipping(shipping)?;
        let owner = CartOwner::User(user_id);

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let items = cart_db::list_items_for_update(&mut tx, owner).await?;
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let mut snapshots: Vec<NewOrderItem> = Vec::with_capacity(items.len());
        let mut subtotal = Money::ZERO;

        for item in items {
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

            if let Some(available) = product.available_quantity(variant.as_ref())
                && item.quantity > available
            {
                return Err(CheckoutError::OutOfStock {
                    name: display_name(&product.name, variant.as_ref().map(|v| v.name.as_str())),
                    available,
                });
            }

            // Move inventory while the rows are locked. Variant stock is
            // only decremented when the variant carries its own count;
            // otherwise the product-level pool backs the variant too.
            if product.track_inventory {
                match &variant {
                    Some(v) if v.inventory_quantity.is_some() => {
                        product_db::decrement_variant_inventory(&mut tx, v.id, item.quantity)
                            .await?;
                    }
                    _ => {
                        product_db::decrement_product_inventory(
                            &mut tx,
                            item.product_id,
                            item.quantity,
                        )
                        .await?;
                    }
                }
            }

            let unit_price = product.unit_price(variant.as_ref());
            let line_total = unit_price.times(item.quantity.unsigned_abs());
            subtotal = subtotal + line_total;

            snapshots.push(NewOrderItem {
                product_id: item.product_id,
                product_name: product.name,
                variant_name: variant.as_ref().map(|v| v.name.clone()),
                sku: variant.and_then(|v| v.sku),
                unit_price,
                quantity: item.quantity,
                line_total,
            });
        }

        if snapshots.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        // No payment gateway and no shipping charges yet, so the total is
        // the subtotal.
        let order_id =
            order_db::insert_order(&mut tx, user_id, email, &address, subtotal, subtotal).await?;

        for snapshot in &snapshots {
            order_db::insert_order_item(&mut tx, order_id, snapshot).await?;
        }

        cart_db::clear_in_tx(&mut tx, owner).await?;

        tx.commit().await.map_err(RepositoryError::from)?;

        Ok(order_id)
    }
}

fn display_name(product: &str, variant: Option<&str>) -> String {
    match variant {
        Some(variant) => format!("{product} ({variant})"),
        None => product.to_owned(),
    }
}

fn validate_shipping(input: &ShippingInput) -> Result<ShippingAddress, CheckoutError> {
    let name = required(&input.name, MAX_NAME_LENGTH, "Please enter a name")?;
    let address1 = required(
        &input.address1,
        MAX_ADDRESS_LENGTH,
        "Please enter a street address",
    )?;
    let city = required(&input.city, MAX_CITY_LENGTH, "Please enter a city")?;
    let postal_code = required(
        &input.postal_code,
        MAX_POSTAL_CODE_LENGTH,
        "Please enter a postal code",
    )?;
    let country = required(&input.country, MAX_COUNTRY_LENGTH, "Please enter a country")?;

    let address2 = sanitize::clean_line(&input.address2, MAX_ADDRESS_LENGTH);
    let address2 = if address2.is_empty() {
        None
    } else {
        Some(address2)
    };

    Ok(ShippingAddress {
        name,
        address1,
        address2,
        city,
        postal_code,
        country,
    })
}

fn required(value: &str, max: usize, message: &str) -> Result<String, CheckoutError> {
    let cleaned = sanitize::clean_line(value, max);
    if cleaned.is_empty() {
        return Err(CheckoutError::InvalidAddress(message.to_owned()));
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> ShippingInput {
        ShippingInput {
            name: "Mara Jensen".to_owned(),
            address1: "14 Petal Lane".to_owned(),
            address2: String::new(),
            city: "Portland".to_owned(),
            postal_code: "97203".to_owned(),
            country: "United States".to_owned(),
        }
    }

    #[test]
    fn test_valid_shipping_passes() {
        let address = validate_shipping(&valid_input()).expect("valid address");
        assert_eq!(address.name, "Mara Jensen");
        assert_eq!(address.address2, None);
    }

    #[test]
    fn test_missing_required_field_fails() {
        let mut input = valid_input();
        input.city = "   ".to_owned();

        let err = validate_shipping(&input).expect_err("city is required");
        assert!(matches!(err, CheckoutError::InvalidAddress(_)));
        assert_eq!(err.to_string(), "Please enter a city");
    }

    #[test]
    fn test_address2_is_optional_but_kept_when_present() {
        let mut input = valid_input();
        input.address2 = " Unit 4 ".to_owned();

        let address = validate_shipping(&input).expect("valid address");
        assert_eq!(address.address2.as_deref(), Some("Unit 4"));
    }

    #[test]
    fn test_control_characters_are_stripped() {
        let mut input = valid_input();
        input.name = "Mara\x00 Jensen".to_owned();

        let address = validate_shipping(&input).expect("valid address");
        assert_eq!(address.name, "Mara Jensen");
    }

    #[test]
    fn test_out_of_stock_names_the_line() {
        let err = CheckoutError::OutOfStock {
            name: display_name("Calendula Salve", Some("Large")),
            available: 1,
        };
        assert_eq!(err.to_string(), "Calendula Salve (Large): only 1 left in stock");
    }
}
