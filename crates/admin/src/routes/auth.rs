//! Authentication route handlers for the admin panel.
//!
//! Password login and logout. There is no registration or password reset
//! surface here; accounts are managed on `/admin-users` or from the CLI.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::security_events::{self, SecurityEvent, SecurityEventKind};
use crate::error::{self, AppError};
use crate::filters;
use crate::middleware::{ClientIp, OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::routes::{CSS_VERSION, CsrfForm, require_csrf};
use crate::security::csrf;
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Forms
// =============================================================================

/// Login form submission.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub csrf_token: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
///
/// Standalone page; the shared layout assumes a logged-in admin.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub error: Option<String>,
    pub csrf_token: String,
    pub css_version: &'static str,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the login page.
#[instrument(skip(session, admin))]
pub async fn login_page(
    session: Session,
    OptionalAdminAuth(admin): OptionalAdminAuth,
) -> Result<Response, AppError> {
    if admin.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let csrf_token = csrf::token(&session).await?;
    Ok(LoginTemplate {
        email: String::new(),
        error: None,
        csrf_token,
        css_version: CSS_VERSION,
    }
    .into_response())
}

/// Process a login attempt.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ip: ClientIp,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    require_csrf(&state, &session, &ip, &form.csrf_token).await?;

    let result = AuthService::new(state.pool())
        .login(&form.email, &form.password, ip.as_string())
        .await;

    match result {
        Ok(admin) => {
            let current = CurrentAdmin {
                id: admin.id,
                email: admin.email.clone(),
                name: admin.name.clone(),
                role: admin.role,
            };
            set_current_admin(&session, &current).await?;
            error::set_sentry_user(&admin.id, Some(admin.email.as_str()));

            Ok(Redirect::to("/").into_response())
        }
        Err(AuthError::InvalidCredentials) => {
            let csrf_token = csrf::token(&session).await?;
            Ok(LoginTemplate {
                email: form.email,
                error: Some("Invalid email or password.".to_owned()),
                csrf_token,
                css_version: CSS_VERSION,
            }
            .into_response())
        }
        Err(other) => Err(other.into()),
    }
}

/// Log out and drop the session.
#[instrument(skip(state, session, admin, form))]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAdminAuth(admin): OptionalAdminAuth,
    ip: ClientIp,
    Form(form): Form<CsrfForm>,
) -> Result<Redirect, AppError> {
    require_csrf(&state, &session, &ip, &form.csrf_token).await?;

    if let Some(admin) = admin {
        security_events::record(
            state.pool(),
            SecurityEventKind::LoggedOut,
            SecurityEvent::for_admin(admin.id).with_ip(ip.as_string()),
        )
        .await;
    }

    clear_current_admin(&session).await?;
    // Flush drops the whole record so nothing from the old session survives.
    session.flush().await?;
    error::clear_sentry_user();

    Ok(Redirect::to("/auth/login"))
}
