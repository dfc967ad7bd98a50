//! Wishlist route handlers. Everything here requires a logged-in user.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use wildbloom_core::{ProductId, WishlistItemId};

use crate::error::AppError;
use crate::filters;
use crate::middleware::{ClientIp, RequireAuth};
use crate::models::cart::WishlistEntry;
use crate::models::session::CurrentUser;
use crate::routes::cart::CsrfForm;
use crate::routes::{NavView, require_csrf};
use crate::services::{CartError, WishlistService};
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// Wishlist entry display data for templates.
#[derive(Clone)]
pub struct WishlistEntryView {
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub price: String,
    pub in_stock: bool,
    pub saved_at: DateTime<Utc>,
}

impl From<&WishlistEntry> for WishlistEntryView {
    fn from(entry: &WishlistEntry) -> Self {
        Self {
            id: entry.id.as_i32(),
            slug: entry.product_slug.to_string(),
            name: entry.product_name.clone(),
            price: entry.price.to_string(),
            in_stock: entry.in_stock,
            saved_at: entry.created_at,
        }
    }
}

/// Add to wishlist form data.
#[derive(Debug, Deserialize)]
pub struct AddForm {
    pub product_id: i32,
    #[serde(default)]
    pub csrf_token: String,
}

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist/index.html")]
pub struct WishlistTemplate {
    pub nav: NavView,
    pub entries: Vec<WishlistEntryView>,
    /// Message shown when a move-to-cart was refused.
    pub error: Option<String>,
}

async fn render_wishlist(
    state: &AppState,
    session: &Session,
    user: &CurrentUser,
    error: Option<String>,
) -> Result<WishlistTemplate, AppError> {
    let entries = WishlistService::new(state.pool()).entries(user.id).await?;
    let nav = NavView::load(state, session, Some(user)).await?;

    Ok(WishlistTemplate {
        nav,
        entries: entries.iter().map(WishlistEntryView::from).collect(),
        error,
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the wishlist page.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<WishlistTemplate, AppError> {
    render_wishlist(&state, &session, &user, None).await
}

/// Save a product to the wishlist. Saving one that's already saved is a
/// no-op.
#[instrument(skip(state, session, user, form))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    ip: ClientIp,
    Form(form): Form<AddForm>,
) -> Result<Redirect, AppError> {
    require_csrf(&state, &session, &ip, &form.csrf_token).await?;

    WishlistService::new(state.pool())
        .add(user.id, ProductId::new(form.product_id))
        .await?;

    Ok(Redirect::to("/wishlist"))
}

/// Remove a wishlist entry.
#[instrument(skip(state, session, user, form))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    ip: ClientIp,
    Path(item_id): Path<WishlistItemId>,
    Form(form): Form<CsrfForm>,
) -> Result<Redirect, AppError> {
    require_csrf(&state, &session, &ip, &form.csrf_token).await?;

    WishlistService::new(state.pool())
        .remove(user.id, item_id)
        .await?;

    Ok(Redirect::to("/wishlist"))
}

/// Move a wishlist entry into the cart.
///
/// The entry stays on the wishlist when the cart add is refused, and the
/// refusal message renders on the wishlist page.
#[instrument(skip(state, session, user, form))]
pub async fn move_to_cart(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    ip: ClientIp,
    Path(item_id): Path<WishlistItemId>,
    Form(form): Form<CsrfForm>,
) -> Result<Response, AppError> {
    require_csrf(&state, &session, &ip, &form.csrf_token).await?;

    let result = WishlistService::new(state.pool())
        .move_to_cart(user.id, item_id)
        .await;

    match result {
        Ok(()) => Ok(Redirect::to("/cart").into_response()),
        // Gone already, most likely a double submit.
        Err(CartError::ItemNotFound) => Ok(Redirect::to("/wishlist").into_response()),
        Err(CartError::Repository(e)) => Err(e.into()),
        Err(err) => {
            let page = render_wishlist(&state, &session, &user, Some(err.to_string())).await?;
            Ok(page.into_response())
        }
    }
}
