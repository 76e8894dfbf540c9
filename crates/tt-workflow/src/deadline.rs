// deadline.rs - Parse the deadline strings clients submit.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%:z"];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a deadline into a UTC instant.
///
/// Accepts RFC 3339, date-times without an offset (taken as UTC) and bare
/// dates (midnight UTC). Returns `None` for anything else.
pub fn parse_deadline(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn rfc3339_with_offset() {
        assert_eq!(
            parse_deadline("2026-11-01T12:00:00+02:00"),
            Some(utc(2026, 11, 1, 10, 0, 0))
        );
        assert_eq!(
            parse_deadline("2026-11-01T12:00:00Z"),
            Some(utc(2026, 11, 1, 12, 0, 0))
        );
    }

    #[test]
    fn space_separated_with_offset() {
        assert_eq!(
            parse_deadline("2026-11-01 12:00:00+00:00"),
            Some(utc(2026, 11, 1, 12, 0, 0))
        );
    }

    #[test]
    fn naive_values_are_utc() {
        assert_eq!(
            parse_deadline("2026-11-01T08:30:15"),
            Some(utc(2026, 11, 1, 8, 30, 15))
        );
        assert_eq!(
            parse_deadline("2026-11-01T08:30:15.250")
                .map(|dt| dt.timestamp_subsec_millis()),
            Some(250)
        );
        assert_eq!(
            parse_deadline("2026-11-01T08:30"),
            Some(utc(2026, 11, 1, 8, 30, 0))
        );
        assert_eq!(
            parse_deadline("2026-11-01 08:30"),
            Some(utc(2026, 11, 1, 8, 30, 0))
        );
    }

    #[test]
    fn bare_date_is_midnight() {
        assert_eq!(parse_deadline("2026-11-01"), Some(utc(2026, 11, 1, 0, 0, 0)));
        assert_eq!(parse_deadline(" 2026-11-01 "), Some(utc(2026, 11, 1, 0, 0, 0)));
    }

    #[test]
    fn garbage_is_rejected() {
        for raw in ["", "tomorrow", "2026-13-01", "01/11/2026", "2026-11-01T25:00"] {
            assert_eq!(parse_deadline(raw), None, "{raw}");
        }
    }
}
