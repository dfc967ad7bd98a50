//! Argon2id password hashing for admin accounts.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Minimum accepted password length, enforced when creating admin users.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A structurally valid hash of a throwaway password. Verified against when
/// the account doesn't exist, so lookups that miss cost the same as lookups
/// that hit.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$gZiV/M1gPc22ElAH/Jh1Hw$CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno";

/// Hash a password with Argon2id and a fresh random salt.
///
/// # Errors
///
/// Returns an error if hashing fails, which with the default parameters
/// only happens on salt generation failure.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash string.
///
/// A wrong password is `Ok(false)`; `Err` means the stored hash itself is
/// malformed.
///
/// # Errors
///
/// Returns an error if the stored hash cannot be parsed.
pub fn verify_password(
    password: &str,
    hash: &str,
) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Burn the same work as a real verification without an account to check.
///
/// Called on login when no admin matches the email, so response timing does
/// not reveal which addresses hold admin accounts.
pub fn dummy_verify(password: &str) {
    let _ = verify_password(password, DUMMY_HASH);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("a sturdy admin password").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("a sturdy admin password", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn test_dummy_hash_parses() {
        // dummy_verify only equalizes timing if the constant actually parses.
        assert!(PasswordHash::new(DUMMY_HASH).is_ok());
        dummy_verify("anything");
    }
}
