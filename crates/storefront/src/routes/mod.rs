//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (featured products)
//!
//! # Products
//! GET  /products               - Catalog listing (paged)
//! GET  /products/{slug}        - Product detail with variant selector
//!
//! # Cart
//! GET  /cart                   - Cart page
//! POST /cart/items             - Add to cart
//! POST /cart/items/{id}        - Update line quantity
//! POST /cart/items/{id}/remove - Remove line
//! GET  /cart/count             - Cart count badge (HTMX fragment)
//!
//! # Wishlist (requires auth)
//! GET  /wishlist               - Wishlist page
//! POST /wishlist/items         - Add to wishlist
//! POST /wishlist/items/{id}/remove       - Remove entry
//! POST /wishlist/items/{id}/move-to-cart - Move entry to cart
//!
//! # Checkout (requires auth)
//! GET  /checkout               - Checkout form
//! POST /checkout               - Place order
//! GET  /checkout/confirmation/{id} - Order confirmation
//!
//! # Auth
//! GET  /auth/login             - Login page (`?next=` redirect support)
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//! GET  /auth/verify            - Email verification landing
//! GET  /auth/forgot-password   - Password reset request page
//! POST /auth/forgot-password   - Password reset request action
//! GET  /auth/reset-password    - Password reset form (token in query)
//! POST /auth/reset-password    - Password reset action
//!
//! # Account (requires auth)
//! GET  /account                - Account overview
//! GET  /account/orders         - Order history
//! GET  /account/orders/{id}    - Order detail
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::db::security_events::{self, SecurityEvent, SecurityEventKind};
use crate::error::AppError;
use crate::middleware::{ClientIp, api_rate_limiter, auth_rate_limiter};
use crate::models::session::CurrentUser;
use crate::security::csrf;
use crate::services::CartService;
use crate::state::AppState;

/// Cache-busting version for the stylesheet, emitted by the build script.
const CSS_VERSION: &str = env!("CSS_VERSION");

/// Header and navigation data rendered on every page.
pub struct NavView {
    /// Display name of the logged-in user, if any.
    pub user_name: Option<String>,
    /// Units in the cart, shown in the header badge.
    pub cart_count: i64,
    /// Session CSRF token; every form on the page embeds it.
    pub csrf_token: String,
    /// Stylesheet version appended to its URL.
    pub css_version: &'static str,
}

impl NavView {
    /// Build the navigation data for the current request.
    ///
    /// Reads the cart count only when a cart identity already exists, so
    /// rendering a page never mints a guest token.
    ///
    /// # Errors
    ///
    /// Returns `AppError` if the session or cart can't be read.
    pub async fn load(
        state: &AppState,
        session: &Session,
        user: Option<&CurrentUser>,
    ) -> Result<Self, AppError> {
        let csrf_token = csrf::token(session).await?;

        let cart_count = match cart::existing_owner(session, user).await? {
            Some(owner) => CartService::new(state.pool()).count(owner).await?,
            None => 0,
        };

        Ok(Self {
            user_name: user.map(|u| u.name.clone()),
            cart_count,
            csrf_token,
            css_version: CSS_VERSION,
        })
    }
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
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        .route("/verify", get(auth::verify_email))
        .route(
            "/forgot-password",
            get(auth::forgot_password_page).post(auth::forgot_password),
        )
        .route(
            "/reset-password",
            get(auth::reset_password_page).post(auth::reset_password),
        )
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{slug}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/items", post(cart::add))
        .route("/items/{id}", post(cart::update))
        .route("/items/{id}/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/items", post(wishlist::add))
        .route("/items/{id}/remove", post(wishlist::remove))
        .route("/items/{id}/move-to-cart", post(wishlist::move_to_cart))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::place_order))
        .route("/confirmation/{id}", get(checkout::confirmation))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/orders", get(account::orders))
        .route("/orders/{id}", get(account::order_detail))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Product routes
        .nest("/products", product_routes())
        // Cart routes, rate limited per IP
        .nest("/cart", cart_routes().layer(api_rate_limiter()))
        // Wishlist routes
        .nest("/wishlist", wishlist_routes())
        // Checkout routes
        .nest("/checkout", checkout_routes())
        // Account routes
        .nest("/account", account_routes())
        // Auth routes, strictly rate limited per IP
        .nest("/auth", auth_routes().layer(auth_rate_limiter()))
}
