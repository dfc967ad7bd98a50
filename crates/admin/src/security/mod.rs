//! Request-level security helpers: CSRF tokens, password hashing, and input
//! sanitization.

pub mod csrf;
pub mod password;
pub mod sanitize;
