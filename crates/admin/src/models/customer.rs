//! Customer domain types.
//!
//! Customers are storefront accounts; the panel reads them for support work
//! and never writes to the `storefront` schema.

use chrono::{DateTime, Utc};

use wildbloom_core::{Email, UserId};

/// A storefront customer account.
#[derive(Debug, Clone)]
pub struct Customer {
    /// Unique customer (storefront user) ID.
    pub id: UserId,
    /// Customer's email address.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// When the email was verified, if it has been.
    pub email_verified_at: Option<DateTime<Utc>>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// A customer row for the list page, with aggregate order data joined in.
#[derive(Debug, Clone)]
pub struct CustomerSummary {
    /// The customer account.
    pub customer: Customer,
    /// Number of orders the customer has placed.
    pub order_count: i64,
}

impl Customer {
    /// Whether the account's email has been verified.
    #[must_use]
    pub const fn is_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }
}
