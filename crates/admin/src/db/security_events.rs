//! Append-only security event log for the admin panel.
//!
//! Same contract as the storefront's log: [`record`] swallows database
//! errors after logging them, and nothing ever updates or deletes rows.
//! Account-management kinds exist here because admin accounts are only
//! created, re-roled, and deleted from this binary and the CLI.

use sqlx::PgPool;

use wildbloom_core::AdminUserId;

/// What happened. Stored as a lowercase string in the `kind` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEventKind {
    LoginSucceeded,
    LoginFailed,
    LoggedOut,
    AdminUserCreated,
    AdminUserDeleted,
    RoleChanged,
    CsrfRejected,
}

impl SecurityEventKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LoginSucceeded => "login_succeeded",
            Self::LoginFailed => "login_failed",
            Self::LoggedOut => "logged_out",
            Self::AdminUserCreated => "admin_user_created",
            Self::AdminUserDeleted => "admin_user_deleted",
            Self::RoleChanged => "role_changed",
            Self::CsrfRejected => "csrf_rejected",
        }
    }

    /// Failure kinds also emit a `tracing` warning when recorded.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::LoginFailed | Self::CsrfRejected)
    }
}

/// A security event about to be written.
#[derive(Debug, Clone, Default)]
pub struct SecurityEvent {
    pub admin_user_id: Option<AdminUserId>,
    pub email: Option<String>,
    pub ip_address: Option<String>,
    pub detail: Option<serde_json::Value>,
}

impl SecurityEvent {
    #[must_use]
    pub fn for_admin(admin_user_id: AdminUserId) -> Self {
        Self {
            admin_user_id: Some(admin_user_id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn for_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_ip(mut self, ip: Option<String>) -> Self {
        self.ip_address = ip;
        self
    }

    #[must_use]
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// Record a security event, best-effort.
///
/// Insert failures are logged and dropped so a broken audit trail cannot
/// fail the request that triggered it.
pub async fn record(pool: &PgPool, kind: SecurityEventKind, event: SecurityEvent) {
    if kind.is_failure() {
        tracing::warn!(
            kind = kind.as_str(),
            email = event.email.as_deref(),
            ip = event.ip_address.as_deref(),
            "security event"
        );
    }

    let result = sqlx::query(
        "INSERT INTO admin.security_events (kind, admin_user_id, email, ip_address, detail)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(kind.as_str())
    .bind(event.admin_user_id)
    .bind(&event.email)
    .bind(&event.ip_address)
    .bind(&event.detail)
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::error!(kind = kind.as_str(), error = %e, "failed to record security event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_strings_are_stable() {
        assert_eq!(SecurityEventKind::LoginSucceeded.as_str(), "login_succeeded");
        assert_eq!(
            SecurityEventKind::AdminUserCreated.as_str(),
            "admin_user_created"
        );
        assert_eq!(SecurityEventKind::RoleChanged.as_str(), "role_changed");
    }

    #[test]
    fn test_failure_kinds() {
        assert!(SecurityEventKind::LoginFailed.is_failure());
        assert!(SecurityEventKind::CsrfRejected.is_failure());
        assert!(!SecurityEventKind::LoginSucceeded.is_failure());
        assert!(!SecurityEventKind::RoleChanged.is_failure());
    }

    #[test]
    fn test_event_builder() {
        let event = SecurityEvent::for_email("ops@wildbloom.test")
            .with_ip(Some("198.51.100.7".to_string()))
            .with_detail(serde_json::json!({"role": "viewer"}));

        assert_eq!(event.email.as_deref(), Some("ops@wildbloom.test"));
        assert_eq!(event.ip_address.as_deref(), Some("198.51.100.7"));
        assert!(event.admin_user_id.is_none());
        assert!(event.detail.is_some());
    }
}
