//! Request-level security helpers: CSRF tokens, password hashing, input
//! sanitization, and the per-session login throttle.

pub mod csrf;
pub mod password;
pub mod sanitize;
pub mod throttle;
