//! Authentication route handlers.
//!
//! Login, registration, email verification, and password reset. The session
//! work lives here (storing `CurrentUser`, the login throttle, the guest
//! cart merge); the database transitions live in `AuthService`.
//!
//! Failed form posts re-render their page with a message instead of
//! redirecting, so the user keeps what they typed. Cross-page successes
//! redirect with a query flag (`?verified=1`, `?reset=1`).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use crate::db::security_events::{self, SecurityEvent, SecurityEventKind};
use crate::error::{self, AppError};
use crate::filters;
use crate::middleware::{ClientIp, OptionalAuth, clear_current_user, set_current_user};
use crate::models::session::{CurrentUser, keys};
use crate::routes::cart::CsrfForm;
use crate::routes::{NavView, require_csrf};
use crate::security::throttle;
use crate::services::{AuthError, AuthService, CartService};
use crate::state::AppState;

/// Where a login lands when no `next` parameter was carried.
const DEFAULT_NEXT: &str = "/account";

/// Validate a post-login redirect target.
///
/// Only same-origin absolute paths pass; anything else (including
/// protocol-relative `//host` forms) falls back to the account page.
fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_owned(),
        _ => DEFAULT_NEXT.to_owned(),
    }
}

// =============================================================================
// Form and Query Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub next: String,
    #[serde(default)]
    pub csrf_token: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    #[serde(default)]
    pub csrf_token: String,
}

/// Password reset request form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
    #[serde(default)]
    pub csrf_token: String,
}

/// Password reset completion form data.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub token: String,
    pub password: String,
    pub password_confirmation: String,
    #[serde(default)]
    pub csrf_token: String,
}

/// Query parameters for the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
    pub verified: Option<u8>,
    pub reset: Option<u8>,
}

/// Query parameters for emailed-link landings.
#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub nav: NavView,
    pub email: String,
    pub next: String,
    /// Set after following a verification link.
    pub verified: bool,
    /// Set after completing a password reset.
    pub reset: bool,
    pub error: Option<String>,
}

/// Registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub nav: NavView,
    pub name: String,
    pub email: String,
    pub error: Option<String>,
}

/// Post-registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register_success.html")]
pub struct RegisterSuccessTemplate {
    pub nav: NavView,
    pub email: String,
}

/// Password reset request page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub nav: NavView,
    /// Whether the "check your email" confirmation should show.
    pub sent: bool,
}

/// Password reset completion page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub nav: NavView,
    pub token: String,
    pub error: Option<String>,
}

// =============================================================================
// Login
// =============================================================================

/// Display the login page.
#[instrument(skip(state, session, user))]
pub async fn login_page(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<LoginQuery>,
) -> Result<Response, AppError> {
    if user.is_some() {
        return Ok(Redirect::to(DEFAULT_NEXT).into_response());
    }

    let nav = NavView::load(&state, &session, None).await?;
    Ok(LoginTemplate {
        nav,
        email: String::new(),
        next: safe_next(query.next.as_deref()),
        verified: query.verified.is_some(),
        reset: query.reset.is_some(),
        error: None,
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

    let next = safe_next(Some(&form.next));

    // The lockout is checked before any credential work so a locked session
    // can't keep burning password verifications.
    let mut lockout = throttle::load(&session).await?;
    if let Some(minutes) = lockout.locked_for_minutes(Utc::now()) {
        let message =
            format!("Too many failed attempts. Please try again in {minutes} minutes.");
        return render_login_error(&state, &session, form.email, next, message).await;
    }

    let result = AuthService::new(state.pool())
        .login(&form.email, &form.password, ip.as_string())
        .await;

    match result {
        Ok(user) => {
            throttle::clear(&session).await?;

            let guest_token = session.get::<Uuid>(keys::CART_TOKEN).await?;

            let current = CurrentUser {
                id: user.id,
                email: user.email.clone(),
                name: user.name.clone(),
            };
            set_current_user(&session, &current).await?;

            // A failed merge must not block the login; the guest lines are
            // simply lost to this session.
            if let Some(token) = guest_token {
                if let Err(e) = CartService::new(state.pool())
                    .merge_guest_into_user(token, user.id)
                    .await
                {
                    tracing::error!(error = %e, "guest cart merge failed after login");
                }
                session.remove::<Uuid>(keys::CART_TOKEN).await?;
            }

            error::set_sentry_user(&user.id, Some(user.email.as_str()));

            Ok(Redirect::to(&next).into_response())
        }
        Err(AuthError::InvalidCredentials) => {
            lockout.record_failure(Utc::now());
            throttle::store(&session, lockout).await?;

            if lockout.locked_for_minutes(Utc::now()).is_some() {
                security_events::record(
                    state.pool(),
                    SecurityEventKind::LoginLocked,
                    SecurityEvent::for_email(&form.email).with_ip(ip.as_string()),
                )
                .await;
            }

            render_login_error(
                &state,
                &session,
                form.email,
                next,
                "Invalid email or password.".to_owned(),
            )
            .await
        }
        Err(other) => Err(other.into()),
    }
}

/// Re-render the login page with an error, keeping the typed email.
async fn render_login_error(
    state: &AppState,
    session: &Session,
    email: String,
    next: String,
    message: String,
) -> Result<Response, AppError> {
    let nav = NavView::load(state, session, None).await?;
    Ok(LoginTemplate {
        nav,
        email,
        next,
        verified: false,
        reset: false,
        error: Some(message),
    }
    .into_response())
}

// =============================================================================
// Registration
// =============================================================================

/// Display the registration page.
#[instrument(skip(state, session, user))]
pub async fn register_page(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Response, AppError> {
    if user.is_some() {
        return Ok(Redirect::to(DEFAULT_NEXT).into_response());
    }

    let nav = NavView::load(&state, &session, None).await?;
    Ok(RegisterTemplate {
        nav,
        name: String::new(),
        email: String::new(),
        error: None,
    }
    .into_response())
}

/// Process a registration.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ip: ClientIp,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    require_csrf(&state, &session, &ip, &form.csrf_token).await?;

    let result = AuthService::new(state.pool())
        .register(
            &form.email,
            &form.name,
            &form.password,
            &form.password_confirmation,
            ip.as_string(),
        )
        .await;

    match result {
        Ok((user, token)) => {
            send_verification_link(&state, user.email.as_str(), &user.name, &token).await;

            let nav = NavView::load(&state, &session, None).await?;
            Ok(RegisterSuccessTemplate {
                nav,
                email: user.email.to_string(),
            }
            .into_response())
        }
        Err(err @ (AuthError::Repository(_) | AuthError::PasswordHash(_))) => Err(err.into()),
        Err(err) => {
            let nav = NavView::load(&state, &session, None).await?;
            Ok(RegisterTemplate {
                nav,
                name: form.name,
                email: form.email,
                error: Some(register_error_message(&err)),
            }
            .into_response())
        }
    }
}

/// Send the verification link, or log it when no SMTP relay is configured.
async fn send_verification_link(state: &AppState, email: &str, name: &str, token: &str) {
    let link = format!("{}/auth/verify?token={token}", state.config().base_url);

    match state.email() {
        Some(service) => {
            if let Err(e) = service.send_verification_email(email, name, &link).await {
                tracing::error!(error = %e, "failed to send verification email");
            }
        }
        None => tracing::info!(%link, "verification link (email not configured)"),
    }
}

/// Map a registration failure to the message shown above the form.
fn register_error_message(err: &AuthError) -> String {
    match err {
        AuthError::UserAlreadyExists => "An account with this email already exists.".to_owned(),
        AuthError::InvalidEmail(_) => "Please enter a valid email address.".to_owned(),
        AuthError::PasswordMismatch => "Passwords do not match.".to_owned(),
        AuthError::WeakPassword(message) | AuthError::Validation(message) => message.clone(),
        _ => "Something went wrong. Please try again.".to_owned(),
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Log the user out and destroy the session.
#[instrument(skip(state, session, user, form))]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    ip: ClientIp,
    Form(form): Form<CsrfForm>,
) -> Result<Redirect, AppError> {
    require_csrf(&state, &session, &ip, &form.csrf_token).await?;

    if let Some(user) = user {
        security_events::record(
            state.pool(),
            SecurityEventKind::LoggedOut,
            SecurityEvent::for_user(user.id).with_ip(ip.as_string()),
        )
        .await;
    }

    clear_current_user(&session).await?;
    // Flush drops the whole record, including the guest token and CSRF
    // token, so nothing from the old session survives.
    session.flush().await?;
    error::clear_sentry_user();

    Ok(Redirect::to("/"))
}

// =============================================================================
// Email Verification
// =============================================================================

/// Consume a verification link.
#[instrument(skip(state, session))]
pub async fn verify_email(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<TokenQuery>,
) -> Result<Response, AppError> {
    let invalid_link = "This verification link is invalid or has expired.";

    let Some(token) = query.token else {
        return render_login_error(
            &state,
            &session,
            String::new(),
            DEFAULT_NEXT.to_owned(),
            invalid_link.to_owned(),
        )
        .await;
    };

    match AuthService::new(state.pool()).verify_email(&token).await {
        Ok(_) => Ok(Redirect::to("/auth/login?verified=1").into_response()),
        Err(AuthError::InvalidToken) => {
            render_login_error(
                &state,
                &session,
                String::new(),
                DEFAULT_NEXT.to_owned(),
                invalid_link.to_owned(),
            )
            .await
        }
        Err(other) => Err(other.into()),
    }
}

// =============================================================================
// Password Reset
// =============================================================================

/// Display the password reset request page.
#[instrument(skip(state, session))]
pub async fn forgot_password_page(
    State(state): State<AppState>,
    session: Session,
) -> Result<ForgotPasswordTemplate, AppError> {
    let nav = NavView::load(&state, &session, None).await?;
    Ok(ForgotPasswordTemplate { nav, sent: false })
}

/// Process a password reset request.
///
/// The response is identical whether or not the address has an account, so
/// this endpoint can't be used to probe for registered emails.
#[instrument(skip(state, session, form))]
pub async fn forgot_password(
    State(state): State<AppState>,
    session: Session,
    ip: ClientIp,
    Form(form): Form<ForgotPasswordForm>,
) -> Result<ForgotPasswordTemplate, AppError> {
    require_csrf(&state, &session, &ip, &form.csrf_token).await?;

    let issued = AuthService::new(state.pool())
        .request_password_reset(&form.email, ip.as_string())
        .await?;

    if let Some((user, token)) = issued {
        let link = format!("{}/auth/reset-password?token={token}", state.config().base_url);
        match state.email() {
            Some(service) => {
                if let Err(e) = service
                    .send_password_reset_email(user.email.as_str(), &user.name, &link)
                    .await
                {
                    tracing::error!(error = %e, "failed to send password reset email");
                }
            }
            None => tracing::info!(%link, "password reset link (email not configured)"),
        }
    }

    let nav = NavView::load(&state, &session, None).await?;
    Ok(ForgotPasswordTemplate { nav, sent: true })
}

/// Display the password reset completion page.
#[instrument(skip(state, session))]
pub async fn reset_password_page(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<TokenQuery>,
) -> Result<Response, AppError> {
    let Some(token) = query.token else {
        return Ok(Redirect::to("/auth/forgot-password").into_response());
    };

    let nav = NavView::load(&state, &session, None).await?;
    Ok(ResetPasswordTemplate {
        nav,
        token,
        error: None,
    }
    .into_response())
}

/// Complete a password reset.
#[instrument(skip(state, session, form))]
pub async fn reset_password(
    State(state): State<AppState>,
    session: Session,
    ip: ClientIp,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response, AppError> {
    require_csrf(&state, &session, &ip, &form.csrf_token).await?;

    let result = AuthService::new(state.pool())
        .reset_password(
            &form.token,
            &form.password,
            &form.password_confirmation,
            ip.as_string(),
        )
        .await;

    match result {
        Ok(_) => {
            // The old password no longer exists, so the failure counter has
            // nothing left to protect.
            throttle::clear(&session).await?;
            Ok(Redirect::to("/auth/login?reset=1").into_response())
        }
        Err(err @ (AuthError::Repository(_) | AuthError::PasswordHash(_))) => Err(err.into()),
        Err(err) => {
            let message = match &err {
                AuthError::InvalidToken => {
                    "This reset link is invalid or has expired. Please request a new one."
                        .to_owned()
                }
                AuthError::PasswordMismatch => "Passwords do not match.".to_owned(),
                AuthError::WeakPassword(message) => message.clone(),
                _ => "Something went wrong. Please try again.".to_owned(),
            };

            let nav = NavView::load(&state, &session, None).await?;
            Ok(ResetPasswordTemplate {
                nav,
                token: form.token,
                error: Some(message),
            }
            .into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next_accepts_local_paths() {
        assert_eq!(safe_next(Some("/cart")), "/cart");
        assert_eq!(safe_next(Some("/account/orders")), "/account/orders");
    }

    #[test]
    fn test_safe_next_rejects_offsite_targets() {
        assert_eq!(safe_next(Some("https://evil.example")), DEFAULT_NEXT);
        assert_eq!(safe_next(Some("//evil.example")), DEFAULT_NEXT);
        assert_eq!(safe_next(Some("javascript:alert(1)")), DEFAULT_NEXT);
        assert_eq!(safe_next(Some("")), DEFAULT_NEXT);
        assert_eq!(safe_next(None), DEFAULT_NEXT);
    }
}
