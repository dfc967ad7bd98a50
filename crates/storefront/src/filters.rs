//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use chrono::{DateTime, Utc};

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a timestamp as a short human date, e.g. "Aug 23, 2026".
///
/// Usage in templates: `{{ order.placed_at|short_date }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn short_date(value: &DateTime<Utc>, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(value.format("%b %-d, %Y").to_string())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    #[test]
    fn test_short_date_format() {
        let dt = chrono::Utc
            .with_ymd_and_hms(2026, 8, 3, 12, 0, 0)
            .single()
            .expect("valid timestamp");
        assert_eq!(dt.format("%b %-d, %Y").to_string(), "Aug 3, 2026");
    }
}
