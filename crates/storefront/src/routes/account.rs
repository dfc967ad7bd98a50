//! Account route handlers.
//!
//! Overview, order history, and order detail. Everything here requires a
//! logged-in user, and order lookups are scoped to that user's rows.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use tower_sessions::Session;
use tracing::instrument;

use wildbloom_core::OrderId;

use crate::db::orders as orders_db;
use crate::db::users::UserRepository;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::order::{Order, OrderItem};
use crate::routes::NavView;
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// Order summary row for the history table.
#[derive(Clone)]
pub struct OrderSummaryView {
    pub id: i32,
    pub number: String,
    pub status: &'static str,
    pub total: String,
    pub placed_at: DateTime<Utc>,
}

impl From<&Order> for OrderSummaryView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.as_i32(),
            number: order.number(),
            status: order.status.label(),
            total: order.total.to_string(),
            placed_at: order.created_at,
        }
    }
}

/// Full order display data, shared with the checkout confirmation page.
#[derive(Clone)]
pub struct OrderView {
    pub number: String,
    pub email: String,
    pub status: &'static str,
    pub payment_status: &'static str,
    pub shipping_name: String,
    pub shipping_address1: String,
    pub shipping_address2: Option<String>,
    pub shipping_city: String,
    pub shipping_postal_code: String,
    pub shipping_country: String,
    pub subtotal: String,
    pub total: String,
    pub placed_at: DateTime<Utc>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            number: order.number(),
            email: order.email.to_string(),
            status: order.status.label(),
            payment_status: order.payment_status.label(),
            shipping_name: order.shipping.name.clone(),
            shipping_address1: order.shipping.address1.clone(),
            shipping_address2: order.shipping.address2.clone(),
            shipping_city: order.shipping.city.clone(),
            shipping_postal_code: order.shipping.postal_code.clone(),
            shipping_country: order.shipping.country.clone(),
            subtotal: order.subtotal.to_string(),
            total: order.total.to_string(),
            placed_at: order.created_at,
        }
    }
}

/// Order line display data, from the purchase-time snapshot.
#[derive(Clone)]
pub struct OrderItemView {
    pub name: String,
    pub variant_name: Option<String>,
    pub sku: Option<String>,
    pub quantity: i32,
    pub unit_price: String,
    pub line_total: String,
}

impl From<&OrderItem> for OrderItemView {
    fn from(item: &OrderItem) -> Self {
        Self {
            name: item.product_name.clone(),
            variant_name: item.variant_name.clone(),
            sku: item.sku.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price.to_string(),
            line_total: item.line_total.to_string(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Account overview template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountTemplate {
    pub nav: NavView,
    pub name: String,
    pub email: String,
    pub email_verified: bool,
    pub recent_orders: Vec<OrderSummaryView>,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrderHistoryTemplate {
    pub nav: NavView,
    pub orders: Vec<OrderSummaryView>,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order_detail.html")]
pub struct OrderDetailTemplate {
    pub nav: NavView,
    pub order: OrderView,
    pub items: Vec<OrderItemView>,
}

// =============================================================================
// Handlers
// =============================================================================

/// How many orders the overview page shows before linking to the full list.
const RECENT_ORDER_COUNT: usize = 5;

/// Display the account overview.
#[instrument(skip(state, session, user))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<AccountTemplate, AppError> {
    // The session copy of the user can outlive a verification that happened
    // in another tab, so the verified flag comes from the database row.
    let record = UserRepository::new(state.pool())
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("account".to_owned()))?;

    let orders = orders_db::list_for_user(state.pool(), user.id).await?;
    let recent_orders = orders
        .iter()
        .take(RECENT_ORDER_COUNT)
        .map(OrderSummaryView::from)
        .collect();

    let nav = NavView::load(&state, &session, Some(&user)).await?;

    Ok(AccountTemplate {
        nav,
        name: record.name,
        email: record.email.to_string(),
        email_verified: record.email_verified_at.is_some(),
        recent_orders,
    })
}

/// Display the full order history.
#[instrument(skip(state, session, user))]
pub async fn orders(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<OrderHistoryTemplate, AppError> {
    let orders = orders_db::list_for_user(state.pool(), user.id).await?;
    let nav = NavView::load(&state, &session, Some(&user)).await?;

    Ok(OrderHistoryTemplate {
        nav,
        orders: orders.iter().map(OrderSummaryView::from).collect(),
    })
}

/// Display one order. Returns 404 for orders that exist but belong to
/// someone else, so the route can't be used to probe order ids.
#[instrument(skip(state, session, user))]
pub async fn order_detail(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(order_id): Path<OrderId>,
) -> Result<OrderDetailTemplate, AppError> {
    let order = orders_db::get_for_user(state.pool(), user.id, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;

    let items = orders_db::list_items(state.pool(), order_id).await?;
    let nav = NavView::load(&state, &session, Some(&user)).await?;

    Ok(OrderDetailTemplate {
        nav,
        order: OrderView::from(&order),
        items: items.iter().map(OrderItemView::from).collect(),
    })
}
