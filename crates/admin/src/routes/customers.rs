//! Customer lookup route handlers.
//!
//! Read-only views over storefront accounts for support work. Both pages
//! sit behind the customer permission; customer records are the only PII
//! in the panel beyond order addresses.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use tower_sessions::Session;
use tracing::instrument;

use wildbloom_core::UserId;

use crate::db::customers::CustomerRepository;
use crate::db::orders::OrderRepository;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireViewCustomers;
use crate::models::customer::{Customer, CustomerSummary};
use crate::routes::NavView;
use crate::routes::orders::OrderSummaryView;
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// Customer row for the list page.
#[derive(Clone)]
pub struct CustomerRowView {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub verified: bool,
    pub order_count: i64,
    pub joined_at: DateTime<Utc>,
}

impl From<&CustomerSummary> for CustomerRowView {
    fn from(summary: &CustomerSummary) -> Self {
        Self {
            id: summary.customer.id.as_i32(),
            name: summary.customer.name.clone(),
            email: summary.customer.email.to_string(),
            verified: summary.customer.is_verified(),
            order_count: summary.order_count,
            joined_at: summary.customer.created_at,
        }
    }
}

/// Customer header for the detail page.
#[derive(Clone)]
pub struct CustomerView {
    pub name: String,
    pub email: String,
    pub verified: bool,
    pub joined_at: DateTime<Utc>,
}

impl From<&Customer> for CustomerView {
    fn from(customer: &Customer) -> Self {
        Self {
            name: customer.name.clone(),
            email: customer.email.to_string(),
            verified: customer.is_verified(),
            joined_at: customer.created_at,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Customer list template.
#[derive(Template, WebTemplate)]
#[template(path = "customers/index.html")]
pub struct CustomersTemplate {
    pub nav: NavView,
    pub customers: Vec<CustomerRowView>,
}

/// Customer detail template.
#[derive(Template, WebTemplate)]
#[template(path = "customers/show.html")]
pub struct CustomerDetailTemplate {
    pub nav: NavView,
    pub customer: CustomerView,
    pub orders: Vec<OrderSummaryView>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the customer list with order counts.
#[instrument(skip(state, session, admin))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireViewCustomers(admin): RequireViewCustomers,
) -> Result<CustomersTemplate, AppError> {
    let customers = CustomerRepository::new(state.pool())
        .list_with_order_counts()
        .await?;

    let nav = NavView::load(&session, &admin).await?;
    Ok(CustomersTemplate {
        nav,
        customers: customers.iter().map(CustomerRowView::from).collect(),
    })
}

/// Display one customer and their order history.
#[instrument(skip(state, session, admin))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireViewCustomers(admin): RequireViewCustomers,
    Path(customer_id): Path<UserId>,
) -> Result<CustomerDetailTemplate, AppError> {
    let customer = CustomerRepository::new(state.pool())
        .get(customer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("customer {customer_id}")))?;

    let orders = OrderRepository::new(state.pool())
        .list_for_user(customer_id)
        .await?;

    let nav = NavView::load(&session, &admin).await?;
    Ok(CustomerDetailTemplate {
        nav,
        customer: CustomerView::from(&customer),
        orders: orders.iter().map(OrderSummaryView::from).collect(),
    })
}
