//! Admin account management route handlers.
//!
//! One page holds the account table and the create form; the mutations
//! redirect back to it with a flag, and refusals (last super admin,
//! self-delete) re-render it with the message. Everything sits behind the
//! admin-management permission, which only super admins hold.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use wildbloom_core::{AdminRole, AdminUserId};

use crate::db::AdminUserRepository;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{ClientIp, RequireManageAdminUsers};
use crate::models::{AdminUser, CurrentAdmin};
use crate::routes::{CsrfForm, NavView, require_csrf};
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// Admin account row for the table.
#[derive(Clone)]
pub struct AdminUserRowView {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub role: &'static str,
    /// Stored role name, preselected in the row's role menu.
    pub role_value: &'static str,
    /// The logged-in admin's own row hides its action forms.
    pub is_self: bool,
    pub created_at: DateTime<Utc>,
}

impl AdminUserRowView {
    fn build(user: &AdminUser, viewer: &CurrentAdmin) -> Self {
        Self {
            id: user.id.as_i32(),
            email: user.email.to_string(),
            name: user.name.clone(),
            role: user.role.label(),
            role_value: user.role.as_str(),
            is_self: user.id == viewer.id,
            created_at: user.created_at,
        }
    }
}

/// One entry in a role menu.
#[derive(Clone)]
pub struct RoleOption {
    pub value: &'static str,
    pub label: &'static str,
}

fn role_options() -> Vec<RoleOption> {
    AdminRole::ALL
        .into_iter()
        .map(|role| RoleOption {
            value: role.as_str(),
            label: role.label(),
        })
        .collect()
}

/// Typed state of the create form, kept across failed submissions.
#[derive(Clone)]
pub struct CreateFormView {
    pub email: String,
    pub name: String,
    /// Selected role value. Fresh forms default to the least privileged.
    pub role: String,
}

impl Default for CreateFormView {
    fn default() -> Self {
        Self {
            email: String::new(),
            name: String::new(),
            role: AdminRole::Viewer.as_str().to_owned(),
        }
    }
}

impl From<&CreateAdminForm> for CreateFormView {
    fn from(form: &CreateAdminForm) -> Self {
        Self {
            email: form.email.clone(),
            name: form.name.clone(),
            role: form.role.clone(),
        }
    }
}

// =============================================================================
// Form and Query Types
// =============================================================================

/// Create form data. Passwords are never echoed back on failure.
#[derive(Debug, Deserialize)]
pub struct CreateAdminForm {
    pub email: String,
    pub name: String,
    pub role: String,
    pub password: String,
    pub password_confirmation: String,
    #[serde(default)]
    pub csrf_token: String,
}

/// Role change form data.
#[derive(Debug, Deserialize)]
pub struct RoleForm {
    pub role: String,
    #[serde(default)]
    pub csrf_token: String,
}

/// Page query flags set by the mutation redirects.
#[derive(Debug, Deserialize)]
pub struct AdminUsersQuery {
    pub created: Option<String>,
    pub updated: Option<String>,
    pub deleted: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Admin accounts page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin_users/index.html")]
pub struct AdminUsersTemplate {
    pub nav: NavView,
    pub admins: Vec<AdminUserRowView>,
    pub roles: Vec<RoleOption>,
    pub form: CreateFormView,
    /// Create form validation message, shown next to the form.
    pub form_error: Option<String>,
    /// Refused role change or deletion, shown as a page banner.
    pub action_error: Option<String>,
    pub created: bool,
    pub updated: bool,
    pub deleted: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the account table and create form.
#[instrument(skip(state, session, admin))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireManageAdminUsers(admin): RequireManageAdminUsers,
    Query(query): Query<AdminUsersQuery>,
) -> Result<AdminUsersTemplate, AppError> {
    let admins = AdminUserRepository::new(state.pool()).list_all().await?;

    let nav = NavView::load(&session, &admin).await?;
    Ok(AdminUsersTemplate {
        nav,
        admins: admins
            .iter()
            .map(|user| AdminUserRowView::build(user, &admin))
            .collect(),
        roles: role_options(),
        form: CreateFormView::default(),
        form_error: None,
        action_error: None,
        created: query.created.is_some(),
        updated: query.updated.is_some(),
        deleted: query.deleted.is_some(),
    })
}

/// Re-render the page after a refused mutation.
async fn render_index_error(
    state: &AppState,
    session: &Session,
    admin: &CurrentAdmin,
    form: CreateFormView,
    form_error: Option<String>,
    action_error: Option<String>,
) -> Result<Response, AppError> {
    let admins = AdminUserRepository::new(state.pool()).list_all().await?;

    let nav = NavView::load(session, admin).await?;
    Ok(AdminUsersTemplate {
        nav,
        admins: admins
            .iter()
            .map(|user| AdminUserRowView::build(user, admin))
            .collect(),
        roles: role_options(),
        form,
        form_error,
        action_error,
        created: false,
        updated: false,
        deleted: false,
    }
    .into_response())
}

/// Create an admin account.
#[instrument(skip(state, session, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireManageAdminUsers(admin): RequireManageAdminUsers,
    ip: ClientIp,
    Form(form): Form<CreateAdminForm>,
) -> Result<Response, AppError> {
    require_csrf(&state, &session, &ip, &form.csrf_token).await?;

    let Ok(role) = form.role.parse::<AdminRole>() else {
        return render_index_error(
            &state,
            &session,
            &admin,
            CreateFormView::from(&form),
            Some("Choose a role".to_owned()),
            None,
        )
        .await;
    };

    let result = AuthService::new(state.pool())
        .create_admin_user(
            &form.email,
            &form.name,
            role,
            &form.password,
            &form.password_confirmation,
            admin.id,
            ip.as_string(),
        )
        .await;

    match result {
        Ok(_) => Ok(Redirect::to("/admin-users?created=1").into_response()),
        Err(err @ (AuthError::EmailTaken | AuthError::Validation(_))) => {
            render_index_error(
                &state,
                &session,
                &admin,
                CreateFormView::from(&form),
                Some(err.to_string()),
                None,
            )
            .await
        }
        Err(other) => Err(other.into()),
    }
}

/// Change an account's role.
#[instrument(skip(state, session, form))]
pub async fn update_role(
    State(state): State<AppState>,
    session: Session,
    RequireManageAdminUsers(admin): RequireManageAdminUsers,
    ip: ClientIp,
    Path(target_id): Path<AdminUserId>,
    Form(form): Form<RoleForm>,
) -> Result<Response, AppError> {
    require_csrf(&state, &session, &ip, &form.csrf_token).await?;

    let Ok(role) = form.role.parse::<AdminRole>() else {
        return render_index_error(
            &state,
            &session,
            &admin,
            CreateFormView::default(),
            None,
            Some("Choose a role".to_owned()),
        )
        .await;
    };

    let result = AuthService::new(state.pool())
        .change_role(target_id, role, admin.id, ip.as_string())
        .await;

    match result {
        Ok(_) => Ok(Redirect::to("/admin-users?updated=1").into_response()),
        Err(AuthError::UserNotFound) => {
            render_index_error(
                &state,
                &session,
                &admin,
                CreateFormView::default(),
                None,
                Some("That account no longer exists".to_owned()),
            )
            .await
        }
        Err(err @ AuthError::Validation(_)) => {
            render_index_error(
                &state,
                &session,
                &admin,
                CreateFormView::default(),
                None,
                Some(err.to_string()),
            )
            .await
        }
        Err(other) => Err(other.into()),
    }
}

/// Delete an account.
#[instrument(skip(state, session, form))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireManageAdminUsers(admin): RequireManageAdminUsers,
    ip: ClientIp,
    Path(target_id): Path<AdminUserId>,
    Form(form): Form<CsrfForm>,
) -> Result<Response, AppError> {
    require_csrf(&state, &session, &ip, &form.csrf_token).await?;

    let result = AuthService::new(state.pool())
        .delete_admin_user(target_id, admin.id, ip.as_string())
        .await;

    match result {
        // A target that vanished mid-request is the asked-for end state.
        Ok(()) | Err(AuthError::UserNotFound) => {
            Ok(Redirect::to("/admin-users?deleted=1").into_response())
        }
        Err(err @ AuthError::Validation(_)) => {
            render_index_error(
                &state,
                &session,
                &admin,
                CreateFormView::default(),
                None,
                Some(err.to_string()),
            )
            .await
        }
        Err(other) => Err(other.into()),
    }
}
