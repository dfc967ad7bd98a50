//! Admin authentication and account management service.
//!
//! Password login plus the super-admin account operations (create, re-role,
//! delete). Session manipulation stays in the route layer; this service owns
//! the database transitions, the guard rails around the last super admin,
//! and the security event trail.
//!
//! There is no registration, email verification, or self-service reset here.
//! Admin accounts are created from this panel by a super admin or from the
//! CLI.

mod error;

pub use error::AuthError;

use serde_json::json;
use sqlx::PgPool;

use wildbloom_core::{AdminRole, AdminUserId, Email};

use crate::db::RepositoryError;
use crate::db::admin_users::AdminUserRepository;
use crate::db::security_events::{self, SecurityEvent, SecurityEventKind};
use crate::models::AdminUser;
use crate::security::password::{self, MIN_PASSWORD_LENGTH};
use crate::security::sanitize;

/// Longest display name we store.
const MAX_NAME_LENGTH: usize = 100;

/// Admin authentication service.
pub struct AuthService<'a> {
    users: AdminUserRepository<'a>,
    pool: &'a PgPool,
}

impl<'a> AuthService<'a> {
    /// Create a new admin authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: AdminUserRepository::new(pool),
            pool,
        }
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Verify an email/password pair.
    ///
    /// When no account matches, a dummy hash is still verified so response
    /// timing does not reveal whether the address holds an admin account.
    /// Both outcomes are written to the security event log.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` when the pair doesn't match.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        ip: Option<String>,
    ) -> Result<AdminUser, AuthError> {
        let Ok(parsed) = Email::parse(email) else {
            password::dummy_verify(password);
            self.record_login_failure(email, ip).await;
            return Err(AuthError::InvalidCredentials);
        };

        let Some((admin, password_hash)) = self.users.get_with_password(&parsed).await? else {
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
            SecurityEvent::for_admin(admin.id).with_ip(ip),
        )
        .await;

        Ok(admin)
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
    // Account Management
    // =========================================================================

    /// Create an admin account.
    ///
    /// `actor` is the super admin performing the action, for the audit trail.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if a field fails validation.
    /// Returns `AuthError::EmailTaken` if the email already has an account.
    pub async fn create_admin_user(
        &self,
        email: &str,
        name: &str,
        role: AdminRole,
        password: &str,
        password_confirmation: &str,
        actor: AdminUserId,
        ip: Option<String>,
    ) -> Result<AdminUser, AuthError> {
        let email = Email::parse(email).map_err(|e| AuthError::Validation(e.to_string()))?;

        let name = sanitize::clean_line(name, MAX_NAME_LENGTH);
        if name.is_empty() {
            return Err(AuthError::Validation("Please enter a name".to_owned()));
        }

        validate_password(password, password_confirmation)?;
        let password_hash = password::hash_password(password)?;

        let admin = self
            .users
            .create(&email, &name, role, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })?;

        security_events::record(
            self.pool,
            SecurityEventKind::AdminUserCreated,
            SecurityEvent::for_admin(actor)
                .with_ip(ip)
                .with_detail(json!({
                    "created_id": admin.id.as_i32(),
                    "role": role.as_str(),
                })),
        )
        .await;

        Ok(admin)
    }

    /// Change an admin account's role.
    ///
    /// Refuses to demote the only remaining super admin; someone must always
    /// be able to manage accounts.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the target doesn't exist.
    /// Returns `AuthError::Validation` if the change would leave no super
    /// admin.
    pub async fn change_role(
        &self,
        target_id: AdminUserId,
        new_role: AdminRole,
        actor: AdminUserId,
        ip: Option<String>,
    ) -> Result<AdminUser, AuthError> {
        let target = self
            .users
            .get_by_id(target_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if target.role == AdminRole::SuperAdmin
            && new_role != AdminRole::SuperAdmin
            && self.users.count_by_role(AdminRole::SuperAdmin).await? <= 1
        {
            return Err(AuthError::Validation(
                "Cannot demote the only super admin".to_owned(),
            ));
        }

        let updated = self.users.update_role(target_id, new_role).await?;

        security_events::record(
            self.pool,
            SecurityEventKind::RoleChanged,
            SecurityEvent::for_admin(actor)
                .with_ip(ip)
                .with_detail(json!({
                    "target_id": target_id.as_i32(),
                    "from": target.role.as_str(),
                    "to": new_role.as_str(),
                })),
        )
        .await;

        Ok(updated)
    }

    /// Delete an admin account.
    ///
    /// Admins cannot delete themselves, and the only remaining super admin
    /// cannot be deleted.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the target doesn't exist.
    /// Returns `AuthError::Validation` if the deletion is refused.
    pub async fn delete_admin_user(
        &self,
        target_id: AdminUserId,
        actor: AdminUserId,
        ip: Option<String>,
    ) -> Result<(), AuthError> {
        if target_id == actor {
            return Err(AuthError::Validation(
                "You cannot delete your own account".to_owned(),
            ));
        }

        let target = self
            .users
            .get_by_id(target_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if target.role == AdminRole::SuperAdmin
            && self.users.count_by_role(AdminRole::SuperAdmin).await? <= 1
        {
            return Err(AuthError::Validation(
                "Cannot delete the only super admin".to_owned(),
            ));
        }

        self.users.delete(target_id).await?;

        security_events::record(
            self.pool,
            SecurityEventKind::AdminUserDeleted,
            SecurityEvent::for_admin(actor)
                .with_ip(ip)
                .with_detail(json!({
                    "target_id": target_id.as_i32(),
                    "email": target.email.as_str(),
                })),
        )
        .await;

        Ok(())
    }
}

/// Validate a password against policy.
fn validate_password(password: &str, confirmation: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    if password != confirmation {
        return Err(AuthError::Validation("Passwords do not match".to_owned()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_length() {
        assert!(matches!(
            validate_password("short", "short"),
            Err(AuthError::Validation(_))
        ));
        assert!(validate_password("long enough", "long enough").is_ok());
    }

    #[test]
    fn test_validate_password_confirmation() {
        assert!(matches!(
            validate_password("long enough", "but different"),
            Err(AuthError::Validation(_))
        ));
    }
}
