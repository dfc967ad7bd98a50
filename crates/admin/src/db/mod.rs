//! Database operations for admin `PostgreSQL`.
//!
//! # Schemas
//!
//! The admin binary shares one database with the storefront and touches all
//! three schemas:
//!
//! - `admin` - admin users, admin sessions, admin security events (writes)
//! - `shop` - products, variants, orders (writes)
//! - `storefront` - customer accounts (reads only)
//!
//! # Modules
//!
//! - [`admin_users`] - admin accounts and credentials
//! - [`products`] - catalog management
//! - [`orders`] - order list, detail, and status transitions
//! - [`customers`] - read-only customer views
//! - [`security_events`] - append-only admin security event log
//!
//! # Migrations
//!
//! Migrations are stored in `crates/cli/migrations/` and run via:
//! ```bash
//! cargo run -p wildbloom-cli -- migrate
//! ```

pub mod admin_users;
pub mod customers;
pub mod orders;
pub mod products;
pub mod security_events;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use admin_users::AdminUserRepository;
pub use customers::CustomerRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
