//! Append-only security event log.
//!
//! Recording an event must never fail the request that triggered it, so
//! callers go through [`record`], which swallows database errors after
//! logging them. The table has no updates or deletes anywhere in the code.

use sqlx::PgPool;

use wildbloom_core::UserId;

/// What happened. Stored as a lowercase string in the `kind` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEventKind {
    Registered,
    LoginSucceeded,
    LoginFailed,
    LoginLocked,
    LoggedOut,
    EmailVerified,
    PasswordResetRequested,
    PasswordResetCompleted,
    CsrfRejected,
}

impl SecurityEventKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::LoginSucceeded => "login_succeeded",
            Self::LoginFailed => "login_failed",
            Self::LoginLocked => "login_locked",
            Self::LoggedOut => "logged_out",
            Self::EmailVerified => "email_verified",
            Self::PasswordResetRequested => "password_reset_requested",
            Self::PasswordResetCompleted => "password_reset_completed",
            Self::CsrfRejected => "csrf_rejected",
        }
    }

    /// Failure kinds also emit a `tracing` warning when recorded.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(
            self,
            Self::LoginFailed | Self::LoginLocked | Self::CsrfRejected
        )
    }
}

/// A security event about to be written.
#[derive(Debug, Clone, Default)]
pub struct SecurityEvent {
    pub user_id: Option<UserId>,
    pub email: Option<String>,
    pub ip_address: Option<String>,
    pub detail: Option<serde_json::Value>,
}

impl SecurityEvent {
    #[must_use]
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
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
/// Insert failures are logged and dropped. A broken audit trail should not
/// turn a successful login into a 500.
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
        "INSERT INTO storefront.security_events (kind, user_id, email, ip_address, detail)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(kind.as_str())
    .bind(event.user_id)
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
        assert_eq!(SecurityEventKind::Registered.as_str(), "registered");
        assert_eq!(SecurityEventKind::LoginFailed.as_str(), "login_failed");
        assert_eq!(SecurityEventKind::CsrfRejected.as_str(), "csrf_rejected");
    }

    #[test]
    fn test_failure_kinds() {
        assert!(SecurityEventKind::LoginFailed.is_failure());
        assert!(SecurityEventKind::LoginLocked.is_failure());
        assert!(SecurityEventKind::CsrfRejected.is_failure());
        assert!(!SecurityEventKind::LoginSucceeded.is_failure());
        assert!(!SecurityEventKind::LoggedOut.is_failure());
    }

    #[test]
    fn test_event_builder() {
        let event = SecurityEvent::for_email("shopper@example.com")
            .with_ip(Some("203.0.113.9".to_string()))
            .with_detail(serde_json::json!({"attempts": 5}));

        assert_eq!(event.email.as_deref(), Some("shopper@example.com"));
        assert_eq!(event.ip_address.as_deref(), Some("203.0.113.9"));
        assert!(event.user_id.is_none());
        assert!(event.detail.is_some());
    }
}
