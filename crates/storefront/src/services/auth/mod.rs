//! Authentication service.
//!
//! Registration, login, email verification, and password reset. Session
//! manipulation (storing `CurrentUser`, rotating ids, the login throttle)
//! stays in the route layer; this service owns the database transitions and
//! the security event trail.

mod error;

pub use error::AuthError;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use wildbloom_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::db::security_events::{self, SecurityEvent, SecurityEventKind};
use crate::db::users::UserRepository;
use crate::models::user::User;
use crate::security::password::{self, MIN_PASSWORD_LENGTH};
use crate::security::sanitize;

/// Longest display name we store.
const MAX_NAME_LENGTH: usize = 100;

/// Verification links stay valid for a day.
const VERIFICATION_TOKEN_TTL_HOURS: i64 = 24;

/// Reset links are short-lived.
const RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    pool: &'a PgPool,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            pool,
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a new user and issue their email verification token.
    ///
    /// Returns the created user and the raw verification token to embed in
    /// the emailed link. Only the token's hash is stored.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::Validation` if the name is empty.
    /// Returns `AuthError::WeakPassword` / `AuthError::PasswordMismatch` if
    /// the password fails policy.
    /// Returns `AuthError::UserAlreadyExists` if the email is taken.
    pub async fn register(
        &self,
        email: &str,
        name: &str,
        password: &str,
        password_confirmation: &str,
        ip: Option<String>,
    ) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;

        let name = sanitize::clean_line(name, MAX_NAME_LENGTH);
        if name.is_empty() {
            return Err(AuthError::Validation("Please enter your name".to_owned()));
        }

        validate_password(password, password_confirmation)?;
        let password_hash = password::hash_password(password)?;

        let user = self
            .users
            .create(&email, &password_hash, &name)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        let token = self.issue_verification_token(user.id).await?;

        security_events::record(
            self.pool,
            SecurityEventKind::Registered,
            SecurityEvent::for_user(user.id).with_ip(ip),
        )
        .await;

        Ok((user, token))
    }

    /// Issue a fresh email verification token for a user.
    ///
    /// Also used by the "resend verification email" action.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the insert fails.
    pub async fn issue_verification_token(&self, user_id: UserId) -> Result<String, AuthError> {
        let token = generate_token();
        let expires_at = Utc::now() + Duration::hours(VERIFICATION_TOKEN_TTL_HOURS);

        self.users
            .create_verification_token(user_id, &hash_token(&token), expires_at)
            .await?;

        Ok(token)
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Verify an email/password pair.
    ///
    /// When no account matches, a dummy hash is still verified so response
    /// timing does not reveal whether the address is registered. Both
    /// outcomes are written to the security event log.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` when the pair doesn't match.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        ip: Option<String>,
    ) -> Result<User, AuthError> {
        let Ok(parsed) = Email::parse(email) else {
            password::dummy_verify(password);
            self.record_login_failure(email, ip).await;
            return Err(AuthError::InvalidCredentials);
        };

        let Some((user, password_hash)) = self.users.get_with_password(&parsed).await? else {
            password::dummy_verify(password);
            self.record_login_failure(parsed.as_str(), ip).await;
            return Err(AuthError::InvalidCredentials);
        };

        if !password::verify_password(password, &password_hash)? {
            self.record_login_failure(parsed.as_str(), ip).await;
            return Err(AuthError::InvalidCredentials);
        }

        security_events::record(
            self.pool,
            SecurityEventKind::LoginSucceeded,
            SecurityEvent::for_user(user.id).with_ip(ip),
        )
        .await;

        Ok(user)
    }

    async fn record_login_failure(&self, email: &str, ip: Option<String>) {
        security_events::record(
            self.pool,
            SecurityEventKind::LoginFailed,
            SecurityEvent::for_email(email).with_ip(ip),
        )
        .await;
    }

    // =========================================================================
    // Email Verification
    // =========================================================================

    /// Consume a verification token from an emailed link.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is unknown, expired,
    /// or already used.
    pub async fn verify_email(&self, raw_token: &str) -> Result<UserId, AuthError> {
        let user_id = self
            .users
            .consume_verification_token(&hash_token(raw_token))
            .await?
            .ok_or(AuthError::InvalidToken)?;

        security_events::record(
            self.pool,
            SecurityEventKind::EmailVerified,
            SecurityEvent::for_user(user_id),
        )
        .await;

        Ok(user_id)
    }

    // =========================================================================
    // Password Reset
    // =========================================================================

    /// Start a password reset for an email address.
    ///
    /// Returns the user and the raw reset token when the account exists, and
    /// `None` otherwise. Callers must respond identically in both cases so
    /// the endpoint cannot be used to probe for accounts.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if a query fails.
    pub async fn request_password_reset(
        &self,
        email: &str,
        ip: Option<String>,
    ) -> Result<Option<(User, String)>, AuthError> {
        let Ok(parsed) = Email::parse(email) else {
            return Ok(None);
        };

        let Some(user) = self.users.get_by_email(&parsed).await? else {
            return Ok(None);
        };

        let token = generate_token();
        let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
        self.users
            .create_reset_token(user.id, &hash_token(&token), expires_at)
            .await?;

        security_events::record(
            self.pool,
            SecurityEventKind::PasswordResetRequested,
            SecurityEvent::for_user(user.id).with_ip(ip),
        )
        .await;

        Ok(Some((user, token)))
    }

    /// Complete a password reset from an emailed link.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` / `AuthError::PasswordMismatch` if
    /// the new password fails policy.
    /// Returns `AuthError::InvalidToken` if the token is unknown, expired,
    /// or already used.
    pub async fn reset_password(
        &self,
        raw_token: &str,
        password: &str,
        password_confirmation: &str,
        ip: Option<String>,
    ) -> Result<UserId, AuthError> {
        validate_password(password, password_confirmation)?;
        let password_hash = password::hash_password(password)?;

        let user_id = self
            .users
            .consume_reset_token(&hash_token(raw_token), &password_hash)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        security_events::record(
            self.pool,
            SecurityEventKind::PasswordResetCompleted,
            SecurityEvent::for_user(user_id).with_ip(ip),
        )
        .await;

        Ok(user_id)
    }
}

/// Validate a password against policy.
fn validate_password(password: &str, confirmation: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    if password != confirmation {
        return Err(AuthError::PasswordMismatch);
    }

    Ok(())
}

/// Generate a random URL-safe token for emailed links.
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a token for storage. Only the hash ever touches the database.
fn hash_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_length() {
        assert!(matches!(
            validate_password("short", "short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("long enough", "long enough").is_ok());
    }

    #[test]
    fn test_validate_password_confirmation() {
        assert!(matches!(
            validate_password("long enough", "but different"),
            Err(AuthError::PasswordMismatch)
        ));
    }

    #[test]
    fn test_generated_tokens_are_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn test_token_hash_is_hex_sha256() {
        let hash = hash_token("some-token");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        // Hashing is deterministic so lookups can match stored rows.
        assert_eq!(hash, hash_token("some-token"));
    }
}
