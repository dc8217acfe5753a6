//! Detection of volatile attribute values

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

/// Decides whether an attribute value should only be asserted as set.
/// Arguments are the resource name, attribute key and attribute value.
pub type IgnoreChange = Arc<dyn Fn(&str, &str, &str) -> bool + Send + Sync>;

/// The predicate used when none is configured.
pub fn default_ignore() -> IgnoreChange {
    Arc::new(default_ignore_change)
}

/// Applies an optional predicate; no predicate flags nothing.
pub fn is_volatile(ignore: Option<&IgnoreChange>, name: &str, key: &str, value: &str) -> bool {
    ignore.is_some_and(|f| f(name, key, value))
}

/// Flags values that look like a UUID or a timestamp.
pub fn default_ignore_change(_name: &str, _key: &str, value: &str) -> bool {
    is_uuid(value) || is_timestamp(value)
}

fn is_uuid(value: &str) -> bool {
    // Only the canonical hyphenated form; `Uuid` also accepts simple and braced.
    value.len() == 36 && Uuid::try_parse(value).is_ok()
}

// Exact layout shapes; chrono's parsers are more lenient.
static RFC3339_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})$")
        .expect("valid RFC 3339 pattern")
});
static DATE_TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2} \d{1,2}:\d{2}:\d{2}(\.\d+)?$").expect("valid date time pattern")
});
static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date pattern"));
static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}:\d{2}:\d{2}(\.\d+)?$").expect("valid time pattern"));
static ZONED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{4}-\d{2}-\d{2} \d{1,2}:\d{2}:\d{2}(?:\.\d+)? [+-]\d{4}) (?:[A-Z]{3,}|[+-]\d{2}(?:\d{2})?)$",
    )
    .expect("valid zoned time pattern")
});

fn is_timestamp(value: &str) -> bool {
    (RFC3339_RE.is_match(value) && DateTime::parse_from_rfc3339(value).is_ok())
        || (DATE_TIME_RE.is_match(value)
            && NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f").is_ok())
        || (DATE_RE.is_match(value) && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok())
        || (TIME_RE.is_match(value) && NaiveTime::parse_from_str(value, "%H:%M:%S%.f").is_ok())
        || is_zoned_timestamp(value)
}

/// `2006-01-02 15:04:05.999999999 -0700 MST`
fn is_zoned_timestamp(value: &str) -> bool {
    ZONED_RE
        .captures(value)
        .is_some_and(|caps| DateTime::parse_from_str(&caps[1], "%Y-%m-%d %H:%M:%S%.f %z").is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("6ba7b810-9dad-11d1-80b4-00c04fd430c8" ; "uuid")]
    #[test_case("2024-03-01T10:20:30Z" ; "rfc3339")]
    #[test_case("2024-03-01T10:20:30.123456789+02:00" ; "rfc3339 nano")]
    #[test_case("2024-03-01 10:20:30" ; "datetime")]
    #[test_case("2024-03-01" ; "date only")]
    #[test_case("10:20:30" ; "time only")]
    #[test_case("2024-03-01 10:20:30.5 +0000 UTC" ; "go time string")]
    #[test_case("2024-03-01 10:20:30 +0200 +02" ; "numeric zone name")]
    #[test_case("9:05:07" ; "single digit hour")]
    fn test_volatile(value: &str) {
        assert!(default_ignore_change("a.b", "k", value));
    }

    #[test_case("" ; "empty")]
    #[test_case("hello" ; "word")]
    #[test_case("42" ; "number")]
    #[test_case("6ba7b8109dad11d180b400c04fd430c8" ; "simple uuid form")]
    #[test_case("2024-13-01" ; "bad month")]
    #[test_case("2024-03-01 10:20:30Z" ; "rfc3339 with space")]
    #[test_case("2024-03-01t10:20:30z" ; "rfc3339 lowercase")]
    #[test_case("2024-3-1" ; "unpadded date")]
    #[test_case("1:2:3" ; "unpadded time")]
    #[test_case("2024-03-01 10:20:30.123 +0000 X" ; "short zone name")]
    #[test_case("2024-03-01 10:20:30 +0000 utc" ; "lowercase zone name")]
    fn test_stable(value: &str) {
        assert!(!default_ignore_change("a.b", "k", value));
    }
}
