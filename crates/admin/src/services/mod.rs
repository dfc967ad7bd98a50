//! Business logic services for the admin panel.
//!
//! Only authentication needs a service layer here. Catalog, order, and
//! customer screens are thin enough that their handlers talk to the
//! repositories directly.

pub mod auth;

pub use auth::{AuthError, AuthService};
