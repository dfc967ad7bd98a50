//! Admin account management commands.
//!
//! The panel itself can create and re-role accounts, but only when a super
//! admin can still log in. These commands are the bootstrap path (first
//! account on a fresh database) and the recovery path (everyone locked out).
//!
//! Hashing matches the panel: Argon2id with default parameters, so a
//! password set here verifies there.

use std::str::FromStr;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHasher, SaltString};
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use sqlx::PgPool;
use thiserror::Error;

use wildbloom_core::{AdminRole, Email};

use super::ConnectError;

/// Shortest password `admin create` accepts; matches the panel's policy.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Length of generated passwords.
const GENERATED_PASSWORD_LENGTH: usize = 24;

/// Errors that can occur during admin account operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Could not reach the database.
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// A query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The role argument is not a known role.
    #[error("invalid role: {0}. Valid roles: super_admin, admin, viewer")]
    InvalidRole(String),

    /// The email argument does not parse.
    #[error("invalid email: {0}")]
    InvalidEmail(String),

    /// The display name is empty.
    #[error("name cannot be empty")]
    EmptyName,

    /// The supplied password is shorter than the panel accepts.
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,

    /// An account already holds this email.
    #[error("an admin account already exists for {0}")]
    UserExists(String),

    /// No account holds this email.
    #[error("no admin account found for {0}")]
    UserNotFound(String),

    /// Refused because it would leave the panel without a super admin.
    #[error("cannot demote the only super admin")]
    LastSuperAdmin,

    /// Password hashing failed.
    #[error("password hashing error: {0}")]
    Hash(argon2::password_hash::Error),
}

/// Create a new admin account.
///
/// When `password` is `None`, a random one is generated and printed to
/// stdout exactly once; it is not stored anywhere in recoverable form.
///
/// # Errors
///
/// Returns an error if an argument fails validation, the email is taken,
/// or the database is unreachable.
pub async fn create(
    email: &str,
    name: &str,
    role: &str,
    password: Option<&str>,
) -> Result<(), AdminError> {
    let role =
        AdminRole::from_str(role).map_err(|_| AdminError::InvalidRole(role.to_owned()))?;
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(AdminError::EmptyName);
    }

    if let Some(p) = password
        && p.len() < MIN_PASSWORD_LENGTH
    {
        return Err(AdminError::PasswordTooShort);
    }

    let generated = password.is_none();
    let password = password.map_or_else(generate_password, ToOwned::to_owned);
    let password_hash = hash_password(&password)?;

    let pool = super::connect().await?;

    let id: i32 = sqlx::query_scalar(
        "INSERT INTO admin.admin_users (email, name, role, password_hash)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
    )
    .bind(email.as_str())
    .bind(name)
    .bind(role.as_str())
    .bind(&password_hash)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return AdminError::UserExists(email.as_str().to_owned());
        }
        AdminError::Database(e)
    })?;

    tracing::info!(
        id,
        email = email.as_str(),
        role = role.as_str(),
        "Admin account created"
    );

    if generated {
        #[allow(clippy::print_stdout)]
        {
            println!("Generated password (shown once, store it now):");
            println!("  {password}");
        }
    }

    Ok(())
}

#[derive(Debug, sqlx::FromRow)]
struct AdminRow {
    id: i32,
    email: String,
    name: String,
    role: String,
    created_at: DateTime<Utc>,
}

/// Print every admin account, oldest first.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn list() -> Result<(), AdminError> {
    let pool = super::connect().await?;

    let rows = sqlx::query_as::<_, AdminRow>(
        "SELECT id, email, name, role, created_at
         FROM admin.admin_users
         ORDER BY created_at, id",
    )
    .fetch_all(&pool)
    .await?;

    if rows.is_empty() {
        tracing::info!("No admin accounts yet. Create one with `wb-cli admin create`");
        return Ok(());
    }

    #[allow(clippy::print_stdout)]
    {
        println!(
            "{:>4}  {:<32}  {:<12}  {:<12}  {}",
            "id", "email", "role", "created", "name"
        );
        for row in &rows {
            println!(
                "{:>4}  {:<32}  {:<12}  {:<12}  {}",
                row.id,
                row.email,
                row.role,
                row.created_at.format("%Y-%m-%d"),
                row.name
            );
        }
    }

    Ok(())
}

/// Change an account's role, looked up by email.
///
/// Refuses to demote the only remaining super admin, same as the panel.
///
/// # Errors
///
/// Returns an error if the role or email is invalid, no account matches,
/// or the change would leave no super admin.
pub async fn set_role(email: &str, role: &str) -> Result<(), AdminError> {
    let new_role =
        AdminRole::from_str(role).map_err(|_| AdminError::InvalidRole(role.to_owned()))?;
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;

    let pool = super::connect().await?;

    let row: Option<(i32, String)> =
        sqlx::query_as("SELECT id, role FROM admin.admin_users WHERE email = $1")
            .bind(email.as_str())
            .fetch_optional(&pool)
            .await?;

    let Some((id, current_role)) = row else {
        return Err(AdminError::UserNotFound(email.as_str().to_owned()));
    };

    if current_role == AdminRole::SuperAdmin.as_str() && new_role != AdminRole::SuperAdmin {
        let supers = count_super_admins(&pool).await?;
        if supers <= 1 {
            return Err(AdminError::LastSuperAdmin);
        }
    }

    sqlx::query("UPDATE admin.admin_users SET role = $1, updated_at = now() WHERE id = $2")
        .bind(new_role.as_str())
        .bind(id)
        .execute(&pool)
        .await?;

    tracing::info!(
        email = email.as_str(),
        from = current_role.as_str(),
        to = new_role.as_str(),
        "Role updated"
    );

    Ok(())
}

async fn count_super_admins(pool: &PgPool) -> Result<i64, AdminError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin.admin_users WHERE role = $1")
        .bind(AdminRole::SuperAdmin.as_str())
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Random alphanumeric password for accounts created without `--password`.
fn generate_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

/// Hash with Argon2id and a fresh random salt.
fn hash_password(password: &str) -> Result<String, AdminError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(AdminError::Hash)?;
    Ok(hash.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_passwords_are_long_and_distinct() {
        let a = generate_password();
        let b = generate_password();

        assert_eq!(a.len(), GENERATED_PASSWORD_LENGTH);
        assert!(a.chars().all(char::is_alphanumeric));
        assert_ne!(a, b);
    }

    #[test]
    fn test_generated_password_hashes_and_verifies() {
        use argon2::password_hash::{PasswordHash, PasswordVerifier};

        let password = generate_password();
        let hash = hash_password(&password).unwrap();

        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        );
    }
}
