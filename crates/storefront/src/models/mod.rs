//! Domain types for the storefront.
//!
//! These types represent validated domain objects separate from database row types.

pub mod cart;
pub mod catalog;
pub mod order;
pub mod session;
pub mod user;
