//! CLI command implementations.
//!
//! Commands are short-lived: connect, do the one thing, exit. They share
//! [`connect`], which loads `.env` and opens a pool from `DATABASE_URL`.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use thiserror::Error;

/// Failure to reach the database at all, before a command does any work.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// `DATABASE_URL` is missing from the environment.
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,

    /// Connection failed.
    #[error("database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Load `.env`, read `DATABASE_URL`, and open a connection pool.
pub(crate) async fn connect() -> Result<PgPool, ConnectError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| ConnectError::MissingDatabaseUrl)?;

    let pool = PgPool::connect(database_url.expose_secret()).await?;
    Ok(pool)
}
