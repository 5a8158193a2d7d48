//! Wall-clock helpers.
//!
//! Records carry epoch milliseconds alongside an ISO-8601 rendering of the
//! same instant, formatted the way browsers render `Date#toISOString`
//! (`2025-06-01T08:30:00.000Z`).

use chrono::{DateTime, Datelike, SecondsFormat, Utc};

/// Current time as epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Renders epoch milliseconds as an ISO-8601 UTC string with millisecond precision.
///
/// Out-of-range values fall back to the Unix epoch.
pub fn iso_from_millis(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or(DateTime::UNIX_EPOCH)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current calendar year (UTC).
pub fn current_year() -> i32 {
    Utc::now().year()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_from_millis_epoch() {
        assert_eq!(iso_from_millis(0), "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_iso_from_millis_keeps_milliseconds() {
        // 2024-03-05T10:20:30.456Z
        assert_eq!(iso_from_millis(1_709_634_030_456), "2024-03-05T10:20:30.456Z");
    }

    #[test]
    fn test_now_millis_is_after_2020() {
        assert!(now_millis() > 1_577_836_800_000);
    }
}
