//! Parsing of caller-supplied expiration timestamps.
//!
//! Expiry values are stored exactly as the caller sent them, so they are parsed
//! both when a license is created and every time it is verified. Rows written
//! before creation validated the value may hold forms the parser does not
//! know; see [`is_expired`] for how those are treated.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::warn;

/// Date-times carrying a numeric offset, with or without a colon.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%z",
];

/// Date-times without an offset. Taken as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%b %d %Y %H:%M:%S",
    "%b %d, %Y %H:%M:%S",
    "%a %b %d %Y %H:%M:%S",
];

/// Bare dates. Midnight UTC.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%b %d %Y",
    "%b %d, %Y",
    "%d %b %Y",
    "%a %b %d %Y",
];

/// Parse an expiration timestamp.
///
/// Accepts RFC 3339 and RFC 2822, ISO-like date-times with a `+hhmm` or
/// `+hh:mm` offset, and the usual offset-less spellings: ISO, US
/// `MM/DD/YYYY` and month names (`Dec 31 2099`, `December 31, 2099`).
/// Offset-less values are taken as UTC. Returns `None` for anything else.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(naive.and_utc());
        }
    }

    DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(value, fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    })
}

/// Whether `expires_at` lies strictly before `now`.
///
/// A missing expiry counts as expired. A stored expiry that cannot be read
/// never compares as past, so the license stays usable; such rows predate
/// creation-time validation and are logged on every check.
pub fn is_expired(expires_at: Option<&str>, now: DateTime<Utc>) -> bool {
    let Some(raw) = expires_at else {
        return true;
    };

    match parse_timestamp(raw) {
        Some(expiry) => now > expiry,
        None => {
            warn!("Unreadable stored expiry {raw:?}, treating license as unexpired");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn end_of_2099() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2099, 12, 31, 0, 0, 0).unwrap()
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let parsed = parse_timestamp("2099-01-01T02:00:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn parses_offset_without_colon() {
        assert_eq!(
            parse_timestamp("2099-12-31T00:00:00.000+0000"),
            Some(end_of_2099())
        );
        assert_eq!(
            parse_timestamp("2099-12-31T05:30:00+0530"),
            Some(end_of_2099())
        );
        assert_eq!(
            parse_timestamp("2099-12-30 19:00:00-0500"),
            Some(end_of_2099())
        );
    }

    #[test]
    fn parses_rfc2822() {
        assert_eq!(
            parse_timestamp("Thu, 31 Dec 2099 00:00:00 +0000"),
            Some(end_of_2099())
        );
    }

    #[test]
    fn parses_naive_forms_as_utc() {
        let expected = Utc.with_ymd_and_hms(2030, 6, 15, 12, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2030-06-15T12:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2030-06-15 12:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2030-06-15T12:30"), Some(expected));
        assert_eq!(parse_timestamp("06/15/2030 12:30:00"), Some(expected));
        assert_eq!(parse_timestamp("Jun 15 2030 12:30:00"), Some(expected));
    }

    #[test]
    fn parses_us_and_month_name_dates() {
        for value in [
            "12/31/2099",
            "2099/12/31",
            "Dec 31 2099",
            "December 31 2099",
            "Dec 31, 2099",
            "December 31, 2099",
            "31 Dec 2099",
            "Thu Dec 31 2099",
        ] {
            assert_eq!(parse_timestamp(value), Some(end_of_2099()), "{value}");
        }
    }

    #[test]
    fn bare_date_is_midnight_utc() {
        assert_eq!(
            parse_timestamp("2000-01-01"),
            Some(Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("next tuesday").is_none());
        assert!(parse_timestamp("2030-13-01").is_none());
        assert!(parse_timestamp("13/01/2030").is_none());
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let expiry = "2030-01-01T00:00:00Z";
        let at = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        assert!(!is_expired(Some(expiry), at));
        assert!(is_expired(Some(expiry), at + chrono::Duration::seconds(1)));
    }

    #[test]
    fn missing_expiry_is_expired() {
        assert!(is_expired(None, Utc::now()));
    }

    #[test]
    fn unreadable_stored_expiry_never_lapses() {
        let far_future = Utc.with_ymd_and_hms(2999, 1, 1, 0, 0, 0).unwrap();
        assert!(!is_expired(Some("soon"), far_future));
        assert!(!is_expired(Some(""), far_future));
    }
}
