//! Shared helpers for the Wildbloom HTTP integration tests.
//!
//! The tests under `tests/` drive the real servers over HTTP and are all
//! `#[ignore]`d so a plain `cargo test` stays hermetic.
//!
//! # Running Tests
//!
//! ```bash
//! # One-time database setup
//! cargo run -p wildbloom-cli -- migrate
//! cargo run -p wildbloom-cli -- seed
//! cargo run -p wildbloom-cli -- admin create \
//!     --email admin@example.com --name "Test Admin" \
//!     --role super_admin --password adminpass123
//!
//! # Start both servers
//! cargo run -p wildbloom-storefront &
//! cargo run -p wildbloom-admin &
//!
//! # Run the ignored tests
//! ADMIN_TEST_EMAIL=admin@example.com ADMIN_TEST_PASSWORD=adminpass123 \
//!     cargo test -p wildbloom-integration-tests -- --ignored
//! ```
//!
//! Base URLs default to localhost and can be overridden with
//! `STOREFRONT_BASE_URL` and `ADMIN_BASE_URL`.
//!
//! Both servers render plain HTML, so the helpers here scrape form values
//! (CSRF tokens, ids embedded in form actions) with string scans instead of
//! pulling in a DOM parser.

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use uuid::Uuid;

/// Base URL for the storefront (configurable via environment).
#[must_use]
pub fn storefront_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Base URL for the admin panel (configurable via environment).
#[must_use]
pub fn admin_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// Create a cookie-holding client representing one browser session.
///
/// Each client carries a distinct `X-Forwarded-For` address so the per-IP
/// auth rate limiter gives every test its own bucket instead of coupling
/// concurrently running tests together.
#[must_use]
pub fn client() -> Client {
    let bytes = Uuid::new_v4().into_bytes();
    let ip = format!("10.{}.{}.{}", bytes[0], bytes[1], bytes[2]);

    let mut headers = HeaderMap::new();
    headers.insert(
        "x-forwarded-for",
        HeaderValue::from_str(&ip).expect("generated address is ASCII"),
    );

    Client::builder()
        .cookie_store(true)
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}

/// Value of the first `<input ... name="{name}" value="...">` in the page.
///
/// Relies on the templates always rendering `name` before `value`, which
/// both servers do.
#[must_use]
pub fn input_value(html: &str, name: &str) -> Option<String> {
    let at = html.find(&format!("name=\"{name}\""))?;
    let rest = html.get(at..)?;
    let marker = "value=\"";
    let tail = rest.get(rest.find(marker)? + marker.len()..)?;
    let end = tail.find('"')?;
    tail.get(..end).map(ToOwned::to_owned)
}

/// CSRF token embedded in a rendered form.
#[must_use]
pub fn csrf_token(html: &str) -> Option<String> {
    input_value(html, "csrf_token")
}

/// First numeric id following `prefix`, searching after the first occurrence
/// of `anchor` (pass `""` to search the whole page).
///
/// Used to pull ids out of form actions, e.g. the line id in
/// `action="/cart/items/42"` or the row id in `/admin-users/7/delete`
/// after anchoring on the row's email address.
#[must_use]
pub fn path_id(html: &str, anchor: &str, prefix: &str) -> Option<i64> {
    let rest = html.get(html.find(anchor)?..)?;
    let tail = rest.get(rest.find(prefix)? + prefix.len()..)?;
    let digits: String = tail.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Fresh address that cannot collide with data left by earlier runs.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_input_value_reads_hidden_fields() {
        let html = r#"<form><input type="hidden" name="csrf_token" value="tok-123"></form>"#;
        assert_eq!(csrf_token(html).unwrap(), "tok-123");
        assert!(input_value(html, "missing").is_none());
    }

    #[test]
    fn test_input_value_takes_first_match() {
        let html = concat!(
            r#"<select name="variant_id"><option value="3">$25</option>"#,
            r#"<option value="4">$50</option></select>"#,
        );
        assert_eq!(input_value(html, "variant_id").unwrap(), "3");
    }

    #[test]
    fn test_path_id_reads_form_actions() {
        let html = r#"<form method="post" action="/cart/items/42"><form action="/cart/items/42/remove">"#;
        assert_eq!(path_id(html, "", "/cart/items/").unwrap(), 42);

        let page = r#"<tr><td>a@example.com</td><td><form action="/admin-users/7/delete">"#;
        assert_eq!(path_id(page, "a@example.com", "/admin-users/").unwrap(), 7);
        assert!(path_id(page, "b@example.com", "/admin-users/").is_none());
    }

    #[test]
    fn test_unique_emails_do_not_repeat() {
        assert_ne!(unique_email("cart"), unique_email("cart"));
    }
}
