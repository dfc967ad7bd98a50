//! Session-bound CSRF tokens.
//!
//! Every state-changing form in the panel carries a hidden `csrf_token`
//! field. The token is minted once per admin session, stored server-side,
//! and compared in constant time on submit. A mismatch is a hard 403;
//! handlers record it as a security event before rejecting.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use tower_sessions::Session;

use crate::models::session::keys;

/// Name of the hidden form field carrying the token.
pub const FORM_FIELD: &str = "csrf_token";

const TOKEN_BYTES: usize = 32;

fn generate() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Get the session's CSRF token, minting one on first use.
///
/// # Errors
///
/// Returns an error if the session store cannot be read or written.
pub async fn token(session: &Session) -> Result<String, tower_sessions::session::Error> {
    if let Some(existing) = session.get::<String>(keys::CSRF_TOKEN).await? {
        return Ok(existing);
    }

    let token = generate();
    session.insert(keys::CSRF_TOKEN, token.clone()).await?;
    Ok(token)
}

/// Check a submitted token against the session's stored token.
///
/// Returns `false` when no token has been minted yet; a form submitted
/// without a session to bind to cannot be trusted.
pub async fn verify(session: &Session, submitted: &str) -> bool {
    let stored: Option<String> = session.get(keys::CSRF_TOKEN).await.ok().flatten();

    match stored {
        Some(stored) => constant_time_compare(&stored, submitted),
        None => false,
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("token", "token"));
        assert!(!constant_time_compare("token", "other"));
        assert!(!constant_time_compare("token", "token2"));
    }

    #[test]
    fn test_generated_tokens_are_unique_and_url_safe() {
        let a = generate();
        let b = generate();

        assert_ne!(a, b);
        // 32 bytes of base64url without padding is 43 characters.
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
