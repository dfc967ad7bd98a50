//! HTTP route handlers for the admin panel.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Dashboard (counts + recent orders)
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! POST /auth/logout            - Logout action
//!
//! # Products (ManageCatalog for mutations)
//! GET  /products               - Product list with low-stock flags
//! GET  /products/new           - Create form
//! POST /products/new           - Create product
//! GET  /products/{id}/edit     - Edit form with variants
//! POST /products/{id}/edit     - Update product
//! POST /products/{id}/variants - Add variant
//! POST /products/{id}/variants/{vid}/delete - Delete variant
//! POST /products/{id}/delete   - Deactivate product
//!
//! # Orders (ManageOrders for mutations)
//! GET  /orders                 - Order list, `?status=` filter
//! GET  /orders/{id}            - Order detail with snapshot lines
//! POST /orders/{id}/status     - Walk the order status forward
//! POST /orders/{id}/payment    - Mark payment paid/refunded
//!
//! # Customers (ViewCustomers)
//! GET  /customers              - Customer list with order counts
//! GET  /customers/{id}         - Customer detail + their orders
//!
//! # Admin users (ManageAdminUsers, super admin only)
//! GET  /admin-users            - List + create form
//! POST /admin-users            - Create admin user
//! POST /admin-users/{id}/role  - Change role
//! POST /admin-users/{id}/delete - Delete admin user
//! ```

pub mod admin_users;
pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;

use wildbloom_core::Permission;

use crate::db::security_events::{self, SecurityEvent, SecurityEventKind};
use crate::error::AppError;
use crate::middleware::{ClientIp, auth_rate_limiter};
use crate::models::CurrentAdmin;
use crate::security::csrf;
use crate::state::AppState;

/// Cache-busting version for the stylesheet, emitted by the build script.
const CSS_VERSION: &str = env!("CSS_VERSION");

/// Header and navigation data rendered on every authenticated page.
///
/// The permission booleans drive which nav links and action forms the
/// templates render. Hiding a form is cosmetic; the permission gates on the
/// POST routes are what actually enforce the role map.
pub struct NavView {
    /// Display name of the logged-in admin.
    pub admin_name: String,
    /// Role label shown next to the name.
    pub role_label: &'static str,
    pub can_manage_catalog: bool,
    pub can_manage_orders: bool,
    pub can_view_customers: bool,
    pub can_manage_admin_users: bool,
    /// Session CSRF token; every form on the page embeds it.
    pub csrf_token: String,
    /// Stylesheet version appended to its URL.
    pub css_version: &'static str,
}

impl NavView {
    /// Build the navigation data for the current request.
    ///
    /// # Errors
    ///
    /// Returns `AppError` if the session can't be read.
    pub async fn load(session: &Session, admin: &CurrentAdmin) -> Result<Self, AppError> {
        let csrf_token = csrf::token(session).await?;

        Ok(Self {
            admin_name: admin.name.clone(),
            role_label: admin.role.label(),
            can_manage_catalog: admin.role.permits(Permission::ManageCatalog),
            can_manage_orders: admin.role.permits(Permission::ManageOrders),
            can_view_customers: admin.role.permits(Permission::ViewCustomers),
            can_manage_admin_users: admin.role.permits(Permission::ManageAdminUsers),
            csrf_token,
            css_version: CSS_VERSION,
        })
    }
}

/// Form carrying only a CSRF token, for plain action buttons.
#[derive(Debug, Deserialize)]
pub struct CsrfForm {
    #[serde(default)]
    pub csrf_token: String,
}

/// Verify the CSRF token on a form submission.
///
/// Rejections are recorded to the security event log before the request is
/// refused.
///
/// # Errors
///
/// Returns `AppError::Forbidden` when the token is missing or wrong.
pub async fn require_csrf(
    state: &AppState,
    session: &Session,
    ip: &ClientIp,
    submitted: &str,
) -> Result<(), AppError> {
    if csrf::verify(session, submitted).await {
        return Ok(());
    }

    security_events::record(
        state.pool(),
        SecurityEventKind::CsrfRejected,
        SecurityEvent::default().with_ip(ip.as_string()),
    )
    .await;

    Err(AppError::Forbidden("CSRF token mismatch".to_string()))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/new", get(products::new_page).post(products::create))
        .route("/{id}/edit", get(products::edit_page).post(products::update))
        .route("/{id}/variants", post(products::add_variant))
        .route("/{id}/variants/{vid}/delete", post(products::delete_variant))
        .route("/{id}/delete", post(products::deactivate))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", post(orders::update_status))
        .route("/{id}/payment", post(orders::update_payment))
}

/// Create the customer routes router.
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(customers::index))
        .route("/{id}", get(customers::show))
}

/// Create the admin user routes router.
pub fn admin_user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin_users::index).post(admin_users::create))
        .route("/{id}/role", post(admin_users::update_role))
        .route("/{id}/delete", post(admin_users::delete))
}

/// Create all routes for the admin panel.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Dashboard
        .route("/", get(dashboard::index))
        // Product management
        .nest("/products", product_routes())
        // Order management
        .nest("/orders", order_routes())
        // Customer lookups
        .nest("/customers", customer_routes())
        // Admin account management
        .nest("/admin-users", admin_user_routes())
        // Auth routes, strictly rate limited per IP
        .nest("/auth", auth_routes().layer(auth_rate_limiter()))
}
