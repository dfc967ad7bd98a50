//! Per-session login throttle.
//!
//! Failed logins increment a counter stored in the session. Hitting the
//! limit locks login for that session for a fixed window; a successful
//! login clears it. This rides on the session store, so it needs no extra
//! table and expires with the session. An IP-keyed rate limit layer in
//! front of the auth routes covers attackers who discard cookies.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session::keys;

/// Failures allowed before the lockout kicks in.
pub const MAX_FAILURES: u32 = 5;

/// How long a locked session stays locked.
pub const LOCKOUT_MINUTES: i64 = 15;

/// Throttle state stored in the session.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LoginThrottle {
    failures: u32,
    locked_until: Option<DateTime<Utc>>,
}

impl LoginThrottle {
    /// Minutes left on an active lockout, or `None` when login is allowed.
    ///
    /// Always reports at least one minute while locked so the user-facing
    /// message never says "0 minutes".
    #[must_use]
    pub fn locked_for_minutes(&self, now: DateTime<Utc>) -> Option<i64> {
        let until = self.locked_until?;
        if until <= now {
            return None;
        }

        let remaining = until - now;
        Some(remaining.num_minutes().max(1))
    }

    /// Record a failed attempt, locking the session at the limit.
    pub fn record_failure(&mut self, now: DateTime<Utc>) {
        // An expired lockout starts a fresh count.
        if self.locked_until.is_some_and(|until| until <= now) {
            self.failures = 0;
            self.locked_until = None;
        }

        self.failures += 1;
        if self.failures >= MAX_FAILURES {
            self.locked_until = Some(now + Duration::minutes(LOCKOUT_MINUTES));
        }
    }

    #[must_use]
    pub const fn failures(&self) -> u32 {
        self.failures
    }
}

/// Load the session's throttle state, defaulting to a clean slate.
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn load(session: &Session) -> Result<LoginThrottle, tower_sessions::session::Error> {
    Ok(session
        .get::<LoginThrottle>(keys::LOGIN_THROTTLE)
        .await?
        .unwrap_or_default())
}

/// Persist the throttle state back to the session.
///
/// # Errors
///
/// Returns an error if the session store cannot be written.
pub async fn store(
    session: &Session,
    throttle: LoginThrottle,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::LOGIN_THROTTLE, throttle).await
}

/// Clear the throttle after a successful login.
///
/// # Errors
///
/// Returns an error if the session store cannot be written.
pub async fn clear(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<LoginThrottle>(keys::LOGIN_THROTTLE).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(minute: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(minute * 60, 0).unwrap_or_default()
    }

    #[test]
    fn test_fresh_throttle_is_unlocked() {
        let throttle = LoginThrottle::default();
        assert_eq!(throttle.locked_for_minutes(at(0)), None);
        assert_eq!(throttle.failures(), 0);
    }

    #[test]
    fn test_locks_after_max_failures() {
        let mut throttle = LoginThrottle::default();
        for _ in 0..MAX_FAILURES - 1 {
            throttle.record_failure(at(0));
        }
        assert_eq!(throttle.locked_for_minutes(at(0)), None);

        throttle.record_failure(at(0));
        assert_eq!(throttle.locked_for_minutes(at(0)), Some(LOCKOUT_MINUTES));
    }

    #[test]
    fn test_lockout_expires() {
        let mut throttle = LoginThrottle::default();
        for _ in 0..MAX_FAILURES {
            throttle.record_failure(at(0));
        }

        assert!(throttle.locked_for_minutes(at(5)).is_some());
        assert_eq!(throttle.locked_for_minutes(at(LOCKOUT_MINUTES)), None);
    }

    #[test]
    fn test_failure_after_expired_lockout_starts_fresh() {
        let mut throttle = LoginThrottle::default();
        for _ in 0..MAX_FAILURES {
            throttle.record_failure(at(0));
        }

        // One failure after expiry should not immediately re-lock.
        throttle.record_failure(at(LOCKOUT_MINUTES + 1));
        assert_eq!(throttle.failures(), 1);
        assert_eq!(throttle.locked_for_minutes(at(LOCKOUT_MINUTES + 1)), None);
    }

    #[test]
    fn test_reports_at_least_one_minute() {
        let mut throttle = LoginThrottle::default();
        for _ in 0..MAX_FAILURES {
            throttle.record_failure(at(0));
        }

        // 30 seconds before expiry still reads as one minute.
        let almost = DateTime::from_timestamp(LOCKOUT_MINUTES * 60 - 30, 0).unwrap_or_default();
        assert_eq!(throttle.locked_for_minutes(almost), Some(1));
    }
}
