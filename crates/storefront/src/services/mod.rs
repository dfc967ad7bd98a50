//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration, login, email verification, password reset
//! - `cart` - Cart mutations with stock checks and guest-cart merge
//! - `catalog` - Cached catalog reads (moka, 60s TTL)
//! - `checkout` - Transactional order placement
//! - `email` - Email delivery via SMTP
//! - `wishlist` - Saved products and move-to-cart

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod email;
pub mod wishlist;

pub use auth::{AuthError, AuthService};
pub use cart::{CartError, CartService, MAX_LINE_QUANTITY};
pub use catalog::{CatalogCache, CatalogPage, CatalogService, ProductDetail};
pub use checkout::{CheckoutError, CheckoutService, ShippingInput};
pub use email::{EmailError, EmailService};
pub use wishlist::WishlistService;
