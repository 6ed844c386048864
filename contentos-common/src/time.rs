//! Timestamp utilities

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};

/// Age reported for dates that are missing or cannot be parsed
pub const UNKNOWN_AGE_DAYS: i64 = 999;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Today's date in the local timezone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Whole days between the `YYYY-MM-DD` prefix of `stamp` and `today`.
///
/// Missing or unparseable stamps are treated as very old.
pub fn days_since(stamp: Option<&str>, today: NaiveDate) -> i64 {
    stamp
        .and_then(|s| s.get(..10))
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        .map(|date| (today - date).num_days())
        .unwrap_or(UNKNOWN_AGE_DAYS)
}

/// Parse the timestamp formats found in kit.yaml and platform responses.
///
/// Accepts RFC 3339 (`2026-01-10T15:00:00Z`, with offsets) and naive ISO
/// datetimes as written by older kits, which are taken to be UTC.
pub fn parse_timestamp(stamp: &str) -> Option<DateTime<Utc>> {
    let stamp = stamp.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(stamp) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(stamp, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(stamp.get(..10)?, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_now_returns_recent_timestamp() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01
        assert!(timestamp.timestamp() < 4_102_444_800); // 2100-01-01
    }

    #[test]
    fn test_days_since_uses_date_prefix() {
        let today = date(2026, 3, 10);
        assert_eq!(days_since(Some("2026-03-08T22:15:00"), today), 2);
        assert_eq!(days_since(Some("2026-03-10"), today), 0);
    }

    #[test]
    fn test_days_since_unparseable_is_very_old() {
        let today = date(2026, 3, 10);
        assert_eq!(days_since(None, today), UNKNOWN_AGE_DAYS);
        assert_eq!(days_since(Some("yesterday"), today), UNKNOWN_AGE_DAYS);
        assert_eq!(days_since(Some("2026"), today), UNKNOWN_AGE_DAYS);
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let zulu = parse_timestamp("2026-01-10T15:00:00Z").unwrap();
        assert_eq!(zulu.hour(), 15);

        let offset = parse_timestamp("2026-01-10T15:00:00+02:00").unwrap();
        assert_eq!(offset.hour(), 13);

        let naive = parse_timestamp("2026-01-10T15:00:00.123456").unwrap();
        assert_eq!(naive.day(), 10);

        let date_only = parse_timestamp("2026-01-10").unwrap();
        assert_eq!(date_only.hour(), 0);

        assert!(parse_timestamp("not a date").is_none());
    }
}
