//! Admin user domain types.

use chrono::{DateTime, Utc};

use wildbloom_core::{AdminRole, AdminUserId, Email};

/// An admin user (domain type).
///
/// Admin accounts are separate from storefront users. They carry no
/// verification state; accounts exist only once a super admin or the CLI
/// creates them.
#[derive(Debug, Clone)]
pub struct AdminUser {
    /// Unique admin user ID.
    pub id: AdminUserId,
    /// Admin's email address.
    pub email: Email,
    /// Admin's display name.
    pub name: String,
    /// Admin's role/permission level.
    pub role: AdminRole,
    /// When the admin was created.
    pub created_at: DateTime<Utc>,
    /// When the admin was last updated.
    pub updated_at: DateTime<Utc>,
}
