//! Dashboard route handler.
//!
//! The landing page answers "what needs attention": orders waiting to be
//! worked, tracked products running out, and the newest orders.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tower_sessions::Session;
use tracing::instrument;

use wildbloom_core::OrderStatus;

use crate::db::customers::CustomerRepository;
use crate::db::orders::OrderRepository;
use crate::db::products::ProductRepository;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::routes::NavView;
use crate::routes::orders::OrderSummaryView;
use crate::state::AppState;

/// How many orders the recent-orders table shows.
const RECENT_ORDER_COUNT: i64 = 5;

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub nav: NavView,
    pub pending_orders: i64,
    pub low_stock_products: i64,
    pub customer_count: i64,
    pub recent_orders: Vec<OrderSummaryView>,
}

/// Display the dashboard.
#[instrument(skip(state, session, admin))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
) -> Result<DashboardTemplate, AppError> {
    let orders = OrderRepository::new(state.pool());

    let counts = orders.status_counts().await?;
    let pending_orders = counts
        .iter()
        .find(|(status, _)| *status == OrderStatus::Pending)
        .map_or(0, |(_, count)| *count);

    let low_stock_products = ProductRepository::new(state.pool())
        .count_low_stock()
        .await?;
    let customer_count = CustomerRepository::new(state.pool()).count().await?;
    let recent = orders.list_recent(RECENT_ORDER_COUNT).await?;

    let nav = NavView::load(&session, &admin).await?;
    Ok(DashboardTemplate {
        nav,
        pending_orders,
        low_stock_products,
        customer_count,
        recent_orders: recent.iter().map(OrderSummaryView::from).collect(),
    })
}
