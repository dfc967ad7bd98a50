//! Authentication middleware and extractors for the admin panel.
//!
//! [`RequireAdminAuth`] covers any logged-in admin; the permission gate
//! extractors layer a role check on top, one per permission in the static
//! role map. Viewers pass the first and fail every gate, which is what makes
//! their access read-only.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use tower_sessions::Session;

use wildbloom_core::Permission;

use crate::models::session::keys;
use crate::models::CurrentAdmin;

/// Extractor that requires a logged-in admin of any role.
///
/// Browser requests that are not logged in are redirected to the login page.
/// Requests under `/api/` get a 401 JSON body instead.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Error returned when a request fails authentication or a permission gate.
pub enum AuthRejection {
    /// Redirect to the login page (for HTML requests).
    RedirectToLogin,
    /// 401 with a JSON body (for `/api/` requests).
    Unauthorized,
    /// Logged in, but the role does not hold the required permission.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                axum::Json(json!({"error": "Authentication required"})),
            )
                .into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "Your role does not allow this action",
            )
                .into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAdminAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let admin: CurrentAdmin = session
            .get(keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| {
                if parts.uri.path().starts_with("/api/") {
                    AuthRejection::Unauthorized
                } else {
                    AuthRejection::RedirectToLogin
                }
            })?;

        Ok(Self(admin))
    }
}

/// Extractor that optionally gets the current admin.
///
/// Unlike `RequireAdminAuth`, this does not reject the request when nobody
/// is logged in. The login page uses it to bounce already-authenticated
/// admins to the dashboard.
pub struct OptionalAdminAuth(pub Option<CurrentAdmin>);

impl<S> FromRequestParts<S> for OptionalAdminAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentAdmin>(keys::CURRENT_ADMIN)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(admin))
    }
}

/// Defines an extractor gating a route on one permission from the role map.
macro_rules! define_permission_gate {
    ($(#[$doc:meta])* $name:ident, $permission:expr) => {
        $(#[$doc])*
        pub struct $name(pub CurrentAdmin);

        impl<S> FromRequestParts<S> for $name
        where
            S: Send + Sync,
        {
            type Rejection = AuthRejection;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &S,
            ) -> Result<Self, Self::Rejection> {
                let RequireAdminAuth(admin) =
                    RequireAdminAuth::from_request_parts(parts, state).await?;

                if !admin.role.permits($permission) {
                    return Err(AuthRejection::Forbidden);
                }

                Ok(Self(admin))
            }
        }
    };
}

define_permission_gate!(
    /// Gate for product, variant, and inventory management.
    RequireManageCatalog,
    Permission::ManageCatalog
);

define_permission_gate!(
    /// Gate for order status changes.
    RequireManageOrders,
    Permission::ManageOrders
);

define_permission_gate!(
    /// Gate for the customer screens. Viewers cannot see customer PII.
    RequireViewCustomers,
    Permission::ViewCustomers
);

define_permission_gate!(
    /// Gate for admin account management. Super admin only.
    RequireManageAdminUsers,
    Permission::ManageAdminUsers
);

/// Helper to set the current admin in the session.
///
/// Cycles the session ID first so a session fixated before login cannot be
/// replayed after it.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::CURRENT_ADMIN, admin).await
}

/// Helper to clear the current admin from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<CurrentAdmin>(keys::CURRENT_ADMIN).await?;
    session.cycle_id().await
}
