//! Database operations for storefront `PostgreSQL`.
//!
//! # Schemas
//!
//! A single database holds three schemas; the storefront reads and writes:
//!
//! - `storefront` - users, verification/reset tokens, sessions, security events
//! - `shop` - products, variants, cart items, wishlist items, orders
//!
//! The `admin` schema belongs to the admin binary.
//!
//! # Modules
//!
//! - [`users`] - user accounts and auth tokens
//! - [`products`] - catalog reads
//! - [`cart`] - cart rows keyed by user id or guest token
//! - [`wishlist`] - wishlist rows
//! - [`orders`] - order placement and history
//! - [`security_events`] - append-only security event log
//!
//! # Migrations
//!
//! Migrations are stored in `crates/cli/migrations/` and run via:
//! ```bash
//! cargo run -p wildbloom-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod cart;
pub mod orders;
pub mod products;
pub mod security_events;
pub mod users;
pub mod wishlist;

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
