//! Admin authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors from admin authentication and account management.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid credentials (wrong password or no such admin). Deliberately
    /// does not say which half was wrong.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The targeted admin account doesn't exist.
    #[error("admin user not found")]
    UserNotFound,

    /// An admin account with this email already exists.
    #[error("An admin with that email already exists")]
    EmailTaken,

    /// A form field failed validation. The message is shown to the admin.
    #[error("{0}")]
    Validation(String),

    /// Password hashing failed, or a stored hash is malformed.
    #[error("password hash error: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
