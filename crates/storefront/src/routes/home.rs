//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::routes::NavView;
use crate::routes::products::ProductCardView;
use crate::services::CatalogService;
use crate::state::AppState;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub nav: NavView,
    /// Featured products for the front-page grid.
    pub featured: Vec<ProductCardView>,
}

/// Display the home page.
#[instrument(skip(state, session, user))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<HomeTemplate, AppError> {
    let featured = CatalogService::new(state.pool(), state.catalog_cache())
        .featured()
        .await?;

    let nav = NavView::load(&state, &session, user.as_ref()).await?;

    Ok(HomeTemplate {
        nav,
        featured: featured.iter().map(ProductCardView::from).collect(),
    })
}
