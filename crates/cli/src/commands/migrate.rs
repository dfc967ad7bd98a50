//! Database migration command.
//!
//! Migrations are plain SQL files under `crates/cli/migrations/`, embedded
//! into the binary at compile time. sqlx tracks applied versions in
//! `_sqlx_migrations`, so running this twice is a no-op. Neither server
//! binary migrates on startup; this command is the only path.

use thiserror::Error;

use super::ConnectError;

/// Embedded migrations from `crates/cli/migrations/`.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Could not reach the database.
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// A migration failed to apply.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
/// A failed migration rolls back; earlier ones stay applied.
pub async fn run() -> Result<(), MigrationError> {
    let pool = super::connect().await?;

    tracing::info!(
        migrations = MIGRATOR.migrations.len(),
        "Applying pending migrations"
    );
    MIGRATOR.run(&pool).await?;
    tracing::info!("Migrations complete");

    Ok(())
}
