//! Cart route handlers.
//!
//! Mutations are plain POST forms with redirect-after-post; the header badge
//! is the one HTMX touchpoint (`GET /cart/count`, re-fetched on the
//! `cart-updated` event). A guest token is minted into the session on the
//! first cart write and never on reads, so crawlers walking GET pages don't
//! leave cart identities behind.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use wildbloom_core::{CartItemId, ProductId, VariantId};

use crate::error::AppError;
use crate::filters;
use crate::middleware::{ClientIp, OptionalAuth};
use crate::models::cart::{CartLine, CartOwner, CartTotals};
use crate::models::session::{CurrentUser, keys};
use crate::routes::{NavView, require_csrf};
use crate::services::{CartError, CartService};
use crate::state::AppState;

// =============================================================================
// Session Helpers
// =============================================================================

/// Cart identity for the current request, if one already exists.
///
/// Logged-in users own their cart by user id; guests by the token minted
/// into the session.
///
/// # Errors
///
/// Returns `AppError` if the session store cannot be read.
pub async fn existing_owner(
    session: &Session,
    user: Option<&CurrentUser>,
) -> Result<Option<CartOwner>, AppError> {
    if let Some(user) = user {
        return Ok(Some(CartOwner::User(user.id)));
    }

    let token = session.get::<Uuid>(keys::CART_TOKEN).await?;
    Ok(token.map(CartOwner::Guest))
}

/// Cart identity for a write, minting a guest token when none exists yet.
async fn owner_or_create(
    session: &Session,
    user: Option<&CurrentUser>,
) -> Result<CartOwner, AppError> {
    if let Some(owner) = existing_owner(session, user).await? {
        return Ok(owner);
    }

    let token = Uuid::new_v4();
    session.insert(keys::CART_TOKEN, token).await?;
    Ok(CartOwner::Guest(token))
}

// =============================================================================
// View Types
// =============================================================================

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub variant_name: Option<String>,
    pub quantity: i32,
    pub unit_price: String,
    pub line_total: String,
    /// Units still available, shown when the line exceeds current stock.
    pub available: Option<i32>,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.id.as_i32(),
            slug: line.product_slug.to_string(),
            name: line.product_name.clone(),
            variant_name: line.variant_name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price.to_string(),
            line_total: line.line_total().to_string(),
            available: line.available,
        }
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddForm {
    pub product_id: i32,
    pub variant_id: Option<i32>,
    pub quantity: Option<i32>,
    pub csrf_token: String,
}

/// Quantity update form data.
#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    pub quantity: i32,
    pub csrf_token: String,
}

/// Bare form carrying only the CSRF token.
#[derive(Debug, Deserialize)]
pub struct CsrfForm {
    pub csrf_token: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/index.html")]
pub struct CartTemplate {
    pub nav: NavView,
    pub lines: Vec<CartLineView>,
    pub item_count: i64,
    pub subtotal: String,
    /// Message shown when an add or update was refused.
    pub error: Option<String>,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: i64,
}

/// Render the cart page for the current owner, empty when none exists.
async fn render_cart(
    state: &AppState,
    session: &Session,
    user: Option<&CurrentUser>,
    error: Option<String>,
) -> Result<CartTemplate, AppError> {
    let (lines, totals) = match existing_owner(session, user).await? {
        Some(owner) => {
            CartService::new(state.pool())
                .lines_with_totals(owner)
                .await?
        }
        None => (Vec::new(), CartTotals::default()),
    };

    let nav = NavView::load(state, session, user).await?;

    Ok(CartTemplate {
        nav,
        lines: lines.iter().map(CartLineView::from).collect(),
        item_count: totals.item_count,
        subtotal: totals.subtotal.to_string(),
        error,
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart page.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<CartTemplate, AppError> {
    render_cart(&state, &session, user.as_ref(), None).await
}

/// Add a product to the cart.
///
/// Plain form posts land back on the cart page; HTMX posts get the count
/// fragment plus a `cart-updated` trigger so the badge refreshes in place.
#[instrument(skip(state, session, user, headers, form))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    ip: ClientIp,
    headers: HeaderMap,
    Form(form): Form<AddForm>,
) -> Result<Response, AppError> {
    require_csrf(&state, &session, &ip, &form.csrf_token).await?;

    let owner = owner_or_create(&session, user.as_ref()).await?;
    let service = CartService::new(state.pool());

    let result = service
        .add(
            owner,
            ProductId::new(form.product_id),
            form.variant_id.map(VariantId::new),
            form.quantity.unwrap_or(1),
        )
        .await;

    match result {
        Ok(()) => {
            crate::error::add_breadcrumb(
                "cart",
                "Added item to cart",
                Some(&[("product_id", &form.product_id.to_string())]),
            );

            if headers.contains_key("hx-request") {
                let count = service.count(owner).await?;
                Ok((
                    AppendHeaders([("HX-Trigger", "cart-updated")]),
                    CartCountTemplate { count },
                )
                    .into_response())
            } else {
                Ok(Redirect::to("/cart").into_response())
            }
        }
        Err(CartError::Repository(e)) => Err(e.into()),
        Err(err) => {
            if headers.contains_key("hx-request") {
                Err(err.into())
            } else {
                let page =
                    render_cart(&state, &session, user.as_ref(), Some(err.to_string())).await?;
                Ok(page.into_response())
            }
        }
    }
}

/// Set a cart line to an exact quantity.
#[instrument(skip(state, session, user, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    ip: ClientIp,
    Path(line_id): Path<CartItemId>,
    Form(form): Form<QuantityForm>,
) -> Result<Response, AppError> {
    require_csrf(&state, &session, &ip, &form.csrf_token).await?;

    let Some(owner) = existing_owner(&session, user.as_ref()).await? else {
        return Ok(Redirect::to("/cart").into_response());
    };

    let result = CartService::new(state.pool())
        .update_quantity(owner, line_id, form.quantity)
        .await;

    match result {
        Ok(()) => Ok(Redirect::to("/cart").into_response()),
        Err(CartError::Repository(e)) => Err(e.into()),
        Err(err) => {
            let page = render_cart(&state, &session, user.as_ref(), Some(err.to_string())).await?;
            Ok(page.into_response())
        }
    }
}

/// Remove a cart line. Removing a line that's already gone still lands back
/// on the cart page.
#[instrument(skip(state, session, user, form))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    ip: ClientIp,
    Path(line_id): Path<CartItemId>,
    Form(form): Form<CsrfForm>,
) -> Result<Redirect, AppError> {
    require_csrf(&state, &session, &ip, &form.csrf_token).await?;

    if let Some(owner) = existing_owner(&session, user.as_ref()).await? {
        CartService::new(state.pool()).remove(owner, line_id).await?;
    }

    Ok(Redirect::to("/cart"))
}

/// Cart count badge fragment (for HTMX).
#[instrument(skip(state, session, user))]
pub async fn count(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<CartCountTemplate, AppError> {
    let count = match existing_owner(&session, user.as_ref()).await? {
        Some(owner) => CartService::new(state.pool()).count(owner).await?,
        None => 0,
    };

    Ok(CartCountTemplate { count })
}
