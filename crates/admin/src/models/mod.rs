//! Domain types for the admin panel.
//!
//! These types represent validated domain objects separate from database row types.

pub mod admin_user;
pub mod catalog;
pub mod customer;
pub mod order;
pub mod session;

pub use admin_user::AdminUser;
pub use session::CurrentAdmin;
