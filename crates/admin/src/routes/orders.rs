//! Order management route handlers.
//!
//! List with status filter tabs, detail with the purchase-time line
//! snapshot, and the two mutations: walking the lifecycle status forward
//! and marking payment by hand.
//!
//! The status form posts the status the admin was looking at alongside the
//! one they chose. The update only applies if the order still holds the
//! viewed status, so two admins working the same order can't silently
//! clobber each other; the loser is bounced back with a conflict notice.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Redirect,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use wildbloom_core::{OrderId, OrderStatus, PaymentStatus};

use crate::db::RepositoryError;
use crate::db::orders::OrderRepository;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{ClientIp, RequireAdminAuth, RequireManageOrders};
use crate::models::order::{Order, OrderItem};
use crate::routes::{NavView, require_csrf};
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// Order row for the list pages. Also used on the dashboard.
#[derive(Clone)]
pub struct OrderSummaryView {
    pub id: i32,
    pub number: String,
    pub email: String,
    pub status: &'static str,
    pub payment_status: &'static str,
    pub total: String,
    pub placed_at: DateTime<Utc>,
}

impl From<&Order> for OrderSummaryView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.as_i32(),
            number: order.number(),
            email: order.email.to_string(),
            status: order.status.label(),
            payment_status: order.payment_status.label(),
            total: order.total.to_string(),
            placed_at: order.created_at,
        }
    }
}

/// One entry in the detail page's status menu.
#[derive(Clone)]
pub struct StatusOption {
    /// Form value, the stored lowercase name.
    pub value: &'static str,
    pub label: &'static str,
}

/// Full order display data for the detail page.
#[derive(Clone)]
pub struct OrderDetailView {
    pub id: i32,
    pub number: String,
    pub email: String,
    pub status: &'static str,
    /// Stored status name, posted back as the compare-and-set guard.
    pub status_value: &'static str,
    pub payment_status: &'static str,
    pub payment_pending: bool,
    pub payment_paid: bool,
    pub shipping_name: String,
    pub shipping_address1: String,
    pub shipping_address2: Option<String>,
    pub shipping_city: String,
    pub shipping_postal_code: String,
    pub shipping_country: String,
    pub subtotal: String,
    pub total: String,
    pub placed_at: DateTime<Utc>,
    /// Legal transitions from the current status; empty for terminal orders.
    pub next_statuses: Vec<StatusOption>,
}

impl From<&Order> for OrderDetailView {
    fn from(order: &Order) -> Self {
        let next_statuses = order
            .next_statuses()
            .into_iter()
            .map(|status| StatusOption {
                value: status.as_str(),
                label: status.label(),
            })
            .collect();

        Self {
            id: order.id.as_i32(),
            number: order.number(),
            email: order.email.to_string(),
            status: order.status.label(),
            status_value: order.status.as_str(),
            payment_status: order.payment_status.label(),
            payment_pending: order.payment_status == PaymentStatus::Pending,
            payment_paid: order.payment_status == PaymentStatus::Paid,
            shipping_name: order.shipping.name.clone(),
            shipping_address1: order.shipping.address1.clone(),
            shipping_address2: order.shipping.address2.clone(),
            shipping_city: order.shipping.city.clone(),
            shipping_postal_code: order.shipping.postal_code.clone(),
            shipping_country: order.shipping.country.clone(),
            subtotal: order.subtotal.to_string(),
            total: order.total.to_string(),
            placed_at: order.created_at,
            next_statuses,
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

/// Status filter tab for the list page.
#[derive(Clone)]
pub struct StatusTab {
    pub label: &'static str,
    pub href: String,
    pub count: i64,
    pub active: bool,
}

/// Build the filter tab row: "All" first, then every status in lifecycle
/// order. Statuses with no orders still get a tab so the row is stable.
fn status_tabs(counts: &[(OrderStatus, i64)], filter: Option<OrderStatus>) -> Vec<StatusTab> {
    let count_for = |status: OrderStatus| {
        counts
            .iter()
            .find(|(s, _)| *s == status)
            .map_or(0, |(_, count)| *count)
    };

    let mut tabs = vec![StatusTab {
        label: "All",
        href: "/orders".to_owned(),
        count: counts.iter().map(|(_, count)| count).sum(),
        active: filter.is_none(),
    }];

    for status in OrderStatus::ALL {
        tabs.push(StatusTab {
            label: status.label(),
            href: format!("/orders?status={}", status.as_str()),
            count: count_for(status),
            active: filter == Some(status),
        });
    }

    tabs
}

// =============================================================================
// Form and Query Types
// =============================================================================

/// List page query. Unknown status values fall back to the unfiltered list.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
}

/// Detail page query flags set by the mutation redirects.
#[derive(Debug, Deserialize)]
pub struct OrderDetailQuery {
    pub updated: Option<String>,
    pub conflict: Option<String>,
    pub invalid: Option<String>,
}

/// Status transition form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    /// Chosen target status.
    pub status: String,
    /// Status shown on the page the form was rendered from.
    pub current_status: String,
    #[serde(default)]
    pub csrf_token: String,
}

/// Payment marking form data.
#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    pub payment_status: String,
    #[serde(default)]
    pub csrf_token: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Order list template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersTemplate {
    pub nav: NavView,
    pub tabs: Vec<StatusTab>,
    pub orders: Vec<OrderSummaryView>,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderDetailTemplate {
    pub nav: NavView,
    pub order: OrderDetailView,
    pub items: Vec<OrderItemView>,
    pub updated: bool,
    pub conflict: bool,
    pub invalid: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the order list, optionally filtered to one status.
#[instrument(skip(state, session, admin))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(query): Query<OrdersQuery>,
) -> Result<OrdersTemplate, AppError> {
    let filter = query
        .status
        .as_deref()
        .and_then(|s| OrderStatus::from_str(s).ok());

    let repo = OrderRepository::new(state.pool());
    let orders = repo.list(filter).await?;
    let counts = repo.status_counts().await?;

    let nav = NavView::load(&session, &admin).await?;
    Ok(OrdersTemplate {
        nav,
        tabs: status_tabs(&counts, filter),
        orders: orders.iter().map(OrderSummaryView::from).collect(),
    })
}

/// Display one order with its line snapshot.
#[instrument(skip(state, session, admin))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(order_id): Path<OrderId>,
    Query(query): Query<OrderDetailQuery>,
) -> Result<OrderDetailTemplate, AppError> {
    let repo = OrderRepository::new(state.pool());
    let order = repo
        .get(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;
    let items = repo.list_items(order_id).await?;

    let nav = NavView::load(&session, &admin).await?;
    Ok(OrderDetailTemplate {
        nav,
        order: OrderDetailView::from(&order),
        items: items.iter().map(OrderItemView::from).collect(),
        updated: query.updated.is_some(),
        conflict: query.conflict.is_some(),
        invalid: query.invalid.is_some(),
    })
}

/// Move an order to the next lifecycle status.
#[instrument(skip(state, session, form))]
pub async fn update_status(
    State(state): State<AppState>,
    session: Session,
    RequireManageOrders(_admin): RequireManageOrders,
    ip: ClientIp,
    Path(order_id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect, AppError> {
    require_csrf(&state, &session, &ip, &form.csrf_token).await?;

    let detail = format!("/orders/{}", order_id.as_i32());

    let (Ok(from), Ok(to)) = (
        OrderStatus::from_str(&form.current_status),
        OrderStatus::from_str(&form.status),
    ) else {
        return Ok(Redirect::to(&format!("{detail}?invalid=1")));
    };

    if !from.can_transition_to(to) {
        return Ok(Redirect::to(&format!("{detail}?invalid=1")));
    }

    match OrderRepository::new(state.pool())
        .update_status(order_id, from, to)
        .await
    {
        Ok(()) => Ok(Redirect::to(&format!("{detail}?updated=1"))),
        Err(RepositoryError::Conflict(_)) => Ok(Redirect::to(&format!("{detail}?conflict=1"))),
        Err(other) => Err(other.into()),
    }
}

/// Mark an order's payment status by hand.
#[instrument(skip(state, session, form))]
pub async fn update_payment(
    State(state): State<AppState>,
    session: Session,
    RequireManageOrders(_admin): RequireManageOrders,
    ip: ClientIp,
    Path(order_id): Path<OrderId>,
    Form(form): Form<PaymentForm>,
) -> Result<Redirect, AppError> {
    require_csrf(&state, &session, &ip, &form.csrf_token).await?;

    let detail = format!("/orders/{}", order_id.as_i32());

    let Ok(payment) = PaymentStatus::from_str(&form.payment_status) else {
        return Ok(Redirect::to(&format!("{detail}?invalid=1")));
    };

    match OrderRepository::new(state.pool())
        .update_payment_status(order_id, payment)
        .await
    {
        Ok(()) => Ok(Redirect::to(&format!("{detail}?updated=1"))),
        Err(RepositoryError::NotFound) => {
            Err(AppError::NotFound(format!("order {order_id}")))
        }
        Err(other) => Err(other.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_tabs_cover_every_status() {
        let counts = vec![(OrderStatus::Pending, 3), (OrderStatus::Shipped, 1)];
        let tabs = status_tabs(&counts, None);

        // "All" plus one tab per lifecycle status.
        assert_eq!(tabs.len(), 1 + OrderStatus::ALL.len());
        assert_eq!(tabs[0].label, "All");
        assert_eq!(tabs[0].count, 4);
        assert!(tabs[0].active);

        let pending = &tabs[1];
        assert_eq!(pending.label, "Pending");
        assert_eq!(pending.count, 3);
        assert_eq!(pending.href, "/orders?status=pending");

        // No orders in processing; the tab still renders.
        assert_eq!(tabs[2].count, 0);
    }

    #[test]
    fn test_status_tabs_mark_the_active_filter() {
        let tabs = status_tabs(&[], Some(OrderStatus::Shipped));

        assert!(!tabs[0].active);
        let shipped = tabs.iter().find(|t| t.label == "Shipped").unwrap();
        assert!(shipped.active);
    }
}
