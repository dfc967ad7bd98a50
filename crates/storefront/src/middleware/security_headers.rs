//! Security headers middleware for XSS, clickjacking, and isolation protection.
//!
//! Every response gets the same locked-down header set; loosen a directive
//! only when a page demonstrably needs it.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

/// Content Security Policy applied to every response.
///
/// `default-src 'none'` and per-resource allowances for same-origin assets.
/// `https://unpkg.com` appears in `script-src` for the pinned htmx bundle
/// loaded by the base template.
const CONTENT_SECURITY_POLICY: &str = "default-src 'none'; \
     script-src 'self' https://unpkg.com; \
     style-src 'self'; \
     font-src 'self'; \
     img-src 'self'; \
     connect-src 'self'; \
     frame-src 'none'; \
     object-src 'none'; \
     base-uri 'self'; \
     form-action 'self'; \
     frame-ancestors 'none'; \
     upgrade-insecure-requests";

/// Permissions Policy denying every sensitive browser feature.
const PERMISSIONS_POLICY: &str = "accelerometer=(), \
     ambient-light-sensor=(), \
     autoplay=(), \
     battery=(), \
     browsing-topics=(), \
     camera=(), \
     cross-origin-isolated=(), \
     display-capture=(), \
     document-domain=(), \
     encrypted-media=(), \
     execution-while-not-rendered=(), \
     execution-while-out-of-viewport=(), \
     fullscreen=(), \
     geolocation=(), \
     gyroscope=(), \
     hid=(), \
     idle-detection=(), \
     interest-cohort=(), \
     magnetometer=(), \
     microphone=(), \
     midi=(), \
     navigation-override=(), \
     payment=(), \
     picture-in-picture=(), \
     publickey-credentials-get=(), \
     screen-wake-lock=(), \
     serial=(), \
     sync-xhr=(), \
     usb=(), \
     web-share=(), \
     xr-spatial-tracking=()";

/// Static header set stamped onto every response.
///
/// - `X-Frame-Options: DENY` blocks clickjacking.
/// - `X-Content-Type-Options: nosniff` blocks MIME sniffing.
/// - `Referrer-Policy: no-referrer` leaks nothing, stricter than same-origin.
/// - `Cache-Control: no-store` keeps carts and account pages out of shared
///   caches.
/// - The three `Cross-Origin-*` policies give full process isolation; the
///   htmx script tag carries `crossorigin="anonymous"` to satisfy
///   `require-corp`.
/// - `X-DNS-Prefetch-Control: off` stops link-hover DNS leakage.
const RESPONSE_HEADERS: &[(&str, &str)] = &[
    ("x-frame-options", "DENY"),
    ("x-content-type-options", "nosniff"),
    ("referrer-policy", "no-referrer"),
    ("content-security-policy", CONTENT_SECURITY_POLICY),
    ("permissions-policy", PERMISSIONS_POLICY),
    ("cache-control", "no-store, max-age=0"),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("cross-origin-embedder-policy", "require-corp"),
    ("x-dns-prefetch-control", "off"),
];

/// Add the full security header set to the response.
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    for (name, value) in RESPONSE_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_values_are_valid() {
        for (name, value) in RESPONSE_HEADERS {
            assert!(HeaderName::from_bytes(name.as_bytes()).is_ok(), "{name}");
            assert!(HeaderValue::from_str(value).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_csp_locks_down_framing_and_scripts() {
        assert!(CONTENT_SECURITY_POLICY.starts_with("default-src 'none'"));
        assert!(CONTENT_SECURITY_POLICY.contains("frame-ancestors 'none'"));
        assert!(!CONTENT_SECURITY_POLICY.contains("unsafe-inline"));
    }
}
