//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] wildbloom_core::EmailError),

    /// Invalid credentials (wrong password or user not found). Deliberately
    /// does not say which half was wrong.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid. The message is shown to the user.
    #[error("{0}")]
    WeakPassword(String),

    /// Password and confirmation don't match.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// A non-password field failed validation. The message is shown to the
    /// user.
    #[error("{0}")]
    Validation(String),

    /// Verification or reset token is unknown, expired, or already used.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Password hashing failed, or a stored hash is malformed.
    #[error("password hash error: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
