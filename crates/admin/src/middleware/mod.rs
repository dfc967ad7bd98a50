//! HTTP middleware stack for the admin panel.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with `PostgreSQL` store, SameSite=Strict)
//! 5. Security headers (stricter CSP than the storefront, no scripts)
//! 6. Rate limiting (governor, on `/auth` only)
//!
//! Authorization happens per-route through the extractors in [`auth`]:
//! `RequireAdminAuth` for any logged-in admin, and one permission gate per
//! entry in the static role map.

pub mod auth;
pub mod client_ip;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    OptionalAdminAuth, RequireAdminAuth, RequireManageAdminUsers, RequireManageCatalog,
    RequireManageOrders, RequireViewCustomers, clear_current_admin, set_current_admin,
};
pub use client_ip::ClientIp;
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
