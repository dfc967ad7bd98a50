//! Checkout route handlers.
//!
//! One POST places the order; the service re-checks stock with catalog rows
//! locked, snapshots the lines, and clears the cart in a single transaction.
//! No payment gateway is wired up, so confirmation is immediate.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use wildbloom_core::OrderId;

use crate::db::orders as orders_db;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{ClientIp, RequireAuth};
use crate::models::cart::CartOwner;
use crate::models::session::CurrentUser;
use crate::routes::account::{OrderItemView, OrderView};
use crate::routes::cart::CartLineView;
use crate::routes::{NavView, require_csrf};
use crate::services::{CartService, CheckoutError, CheckoutService, ShippingInput};
use crate::state::AppState;

// =============================================================================
// Forms and Templates
// =============================================================================

/// Shipping address form data.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutForm {
    pub name: String,
    pub address1: String,
    #[serde(default)]
    pub address2: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub csrf_token: String,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/index.html")]
pub struct CheckoutTemplate {
    pub nav: NavView,
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    /// Submitted values echoed back when validation fails.
    pub form: CheckoutForm,
    pub error: Option<String>,
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/confirmation.html")]
pub struct ConfirmationTemplate {
    pub nav: NavView,
    pub order: OrderView,
    pub items: Vec<OrderItemView>,
}

/// Render the checkout page, or send an empty cart back to `/cart`.
async fn render_checkout(
    state: &AppState,
    session: &Session,
    user: &CurrentUser,
    form: CheckoutForm,
    error: Option<String>,
) -> Result<Response, AppError> {
    let (lines, totals) = CartService::new(state.pool())
        .lines_with_totals(CartOwner::User(user.id))
        .await?;

    if lines.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let nav = NavView::load(state, session, Some(user)).await?;

    Ok(CheckoutTemplate {
        nav,
        lines: lines.iter().map(CartLineView::from).collect(),
        subtotal: totals.subtotal.to_string(),
        form,
        error,
    }
    .into_response())
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the checkout form.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Response, AppError> {
    render_checkout(&state, &session, &user, CheckoutForm::default(), None).await
}

/// Place the order.
#[instrument(skip(state, session, user, form))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    ip: ClientIp,
    Form(form): Form<CheckoutForm>,
) -> Result<Response, AppError> {
    require_csrf(&state, &session, &ip, &form.csrf_token).await?;

    let shipping = ShippingInput {
        name: form.name.clone(),
        address1: form.address1.clone(),
        address2: form.address2.clone(),
        city: form.city.clone(),
        postal_code: form.postal_code.clone(),
        country: form.country.clone(),
    };

    let result = CheckoutService::new(state.pool())
        .place_order(user.id, user.email.as_str(), &shipping)
        .await;

    match result {
        Ok(order_id) => {
            tracing::info!(user_id = %user.id, order_id = %order_id, "order placed");
            crate::error::add_breadcrumb(
                "checkout",
                "Order placed",
                Some(&[("order_id", &order_id.to_string())]),
            );
            Ok(Redirect::to(&format!("/checkout/confirmation/{order_id}")).into_response())
        }
        Err(CheckoutError::EmptyCart) => Ok(Redirect::to("/cart").into_response()),
        Err(CheckoutError::Repository(e)) => Err(e.into()),
        Err(err) => render_checkout(&state, &session, &user, form, Some(err.to_string())).await,
    }
}

/// Display the order confirmation. Only the order's owner can see it.
#[instrument(skip(state, session, user))]
pub async fn confirmation(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(order_id): Path<OrderId>,
) -> Result<ConfirmationTemplate, AppError> {
    let order = orders_db::get_for_user(state.pool(), user.id, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;

    let items = orders_db::list_items(state.pool(), order_id).await?;
    let nav = NavView::load(&state, &session, Some(&user)).await?;

    Ok(ConfirmationTemplate {
        nav,
        order: OrderView::from(&order),
        items: items.iter().map(OrderItemView::from).collect(),
    })
}
