//! Read-only customer queries against the storefront schema.
//!
//! The admin panel never writes `storefront.users`. Registration, email
//! verification, and password changes all belong to the storefront binary.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use wildbloom_core::{Email, UserId};

use super::RepositoryError;
use crate::models::customer::{Customer, CustomerSummary};

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: i32,
    email: String,
    name: String,
    email_verified_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = RepositoryError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            name: row.name,
            email_verified_at: row.email_verified_at,
            created_at: row.created_at,
        })
    }
}

/// Customer row joined with their order count.
#[derive(Debug, sqlx::FromRow)]
struct CustomerSummaryRow {
    id: i32,
    email: String,
    name: String,
    email_verified_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    order_count: i64,
}

impl TryFrom<CustomerSummaryRow> for CustomerSummary {
    type Error = RepositoryError;

    fn try_from(row: CustomerSummaryRow) -> Result<Self, Self::Error> {
        let customer = Customer::try_from(CustomerRow {
            id: row.id,
            email: row.email,
            name: row.name,
            email_verified_at: row.email_verified_at,
            created_at: row.created_at,
        })?;

        Ok(Self {
            customer,
            order_count: row.order_count,
        })
    }
}

/// Repository for customer lookups.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all customers with their order counts, newest signup first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored email is invalid.
    pub async fn list_with_order_counts(&self) -> Result<Vec<CustomerSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerSummaryRow>(
            "SELECT u.id, u.email, u.name, u.email_verified_at, u.created_at,
                    COUNT(o.id) AS order_count
             FROM storefront.users u
             LEFT JOIN shop.orders o ON o.user_id = u.id
             GROUP BY u.id
             ORDER BY u.created_at DESC, u.id DESC",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(CustomerSummary::try_from).collect()
    }

    /// Fetch one customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get(&self, id: UserId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, email, name, email_verified_at, created_at
             FROM storefront.users
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Customer::try_from).transpose()
    }

    /// Total registered customers, for the dashboard.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM storefront.users")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}
