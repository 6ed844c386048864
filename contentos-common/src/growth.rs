//! Upload pacing guardrails and posting windows

use crate::time::parse_timestamp;
use chrono::{DateTime, Duration, Timelike, Utc};
use serde::Serialize;

/// Uploads in one day at which publishing is refused
pub const DAILY_LIMIT: usize = 5;
/// Uploads in one day at which a slowdown is suggested
pub const HIGH_VOLUME: usize = 3;
/// Minimum gap between uploads, minutes
pub const MIN_GAP_MINUTES: i64 = 120;

/// Optimal posting windows, UTC hours `[start, end)`
pub const OPTIMAL_WINDOWS: [(u32, u32); 2] = [(12, 15), (19, 22)];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SafetyReport {
    pub safe: bool,
    pub warnings: Vec<String>,
}

/// Check volume and spacing rules against recent uploads
pub fn check_safety(
    last_publish: Option<DateTime<Utc>>,
    daily_count: usize,
    now: DateTime<Utc>,
) -> SafetyReport {
    let mut warnings = Vec::new();

    if daily_count >= DAILY_LIMIT {
        warnings.push("DAILY LIMIT EXCEEDED (5+ videos). Risk of spam flag.".to_string());
    } else if daily_count >= HIGH_VOLUME {
        warnings.push("High volume (3 videos). Consider slowing down.".to_string());
    }

    if let Some(last) = last_publish {
        let gap = now - last;
        if gap < Duration::minutes(MIN_GAP_MINUTES) {
            let minutes = gap.num_minutes();
            warnings.push(format!(
                "Gap too short ({}m). Wait {}m.",
                minutes,
                MIN_GAP_MINUTES - minutes
            ));
        }
    }

    SafetyReport {
        safe: warnings.is_empty(),
        warnings,
    }
}

/// Most recent publish time and the number of uploads on `now`'s UTC date
pub fn upload_pressure<'a, I>(published: I, now: DateTime<Utc>) -> (Option<DateTime<Utc>>, usize)
where
    I: IntoIterator<Item = &'a str>,
{
    let today = now.format("%Y-%m-%d").to_string();
    let mut last: Option<DateTime<Utc>> = None;
    let mut daily = 0;

    for stamp in published {
        if stamp.starts_with(&today) {
            daily += 1;
        }
        if let Some(ts) = parse_timestamp(stamp) {
            if last.map_or(true, |prev| ts > prev) {
                last = Some(ts);
            }
        }
    }
    (last, daily)
}

/// Hours from UTC for the few zone names the CLI accepts; unknown → 0
pub fn timezone_offset(name: &str) -> f64 {
    match name.to_uppercase().as_str() {
        "IST" => 5.5,
        "EST" => -5.0,
        "PST" => -8.0,
        _ => 0.0,
    }
}

/// Next optimal posting slot, in local time shifted by `tz_offset` hours
pub fn next_slot(now: DateTime<Utc>, tz_offset: f64) -> String {
    let local_hour = (now.hour() as f64 + tz_offset).rem_euclid(24.0);

    for (start, end) in OPTIMAL_WINDOWS {
        let local_start = (start as f64 + tz_offset).rem_euclid(24.0);
        let local_end = (end as f64 + tz_offset).rem_euclid(24.0);

        if local_hour < local_start {
            return format!("Today at {:02}:00 (local)", local_start as u32);
        }
        if local_start <= local_hour && local_hour < local_end {
            return "RIGHT NOW! (Golden Window)".to_string();
        }
    }

    let first_start = (OPTIMAL_WINDOWS[0].0 as f64 + tz_offset).rem_euclid(24.0);
    format!("Tomorrow at {:02}:00 (local)", first_start as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_safe_when_quiet() {
        let report = check_safety(Some(at(8, 0)), 1, at(12, 0));
        assert!(report.safe);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_volume_rules() {
        let limit = check_safety(None, 5, at(12, 0));
        assert!(!limit.safe);
        assert!(limit.warnings[0].starts_with("DAILY LIMIT EXCEEDED"));

        let high = check_safety(None, 3, at(12, 0));
        assert_eq!(high.warnings, vec!["High volume (3 videos). Consider slowing down."]);
    }

    #[test]
    fn test_gap_rule() {
        let report = check_safety(Some(at(11, 15)), 0, at(12, 0));
        assert!(!report.safe);
        assert_eq!(report.warnings, vec!["Gap too short (45m). Wait 75m."]);
    }

    #[test]
    fn test_upload_pressure() {
        let stamps = ["2025-06-01T09:00:00Z", "2025-06-01T11:30:00Z", "2025-05-31T22:00:00Z", "garbage"];
        let (last, daily) = upload_pressure(stamps.iter().copied(), at(12, 0));
        assert_eq!(daily, 2);
        assert_eq!(last, Some(at(11, 30)));
    }

    #[test]
    fn test_next_slot() {
        assert_eq!(next_slot(at(9, 0), 0.0), "Today at 12:00 (local)");
        assert_eq!(next_slot(at(13, 0), 0.0), "RIGHT NOW! (Golden Window)");
        assert_eq!(next_slot(at(16, 0), 0.0), "Today at 19:00 (local)");
        assert_eq!(next_slot(at(23, 0), 0.0), "Tomorrow at 12:00 (local)");
        assert_eq!(next_slot(at(9, 0), -5.0), "Today at 07:00 (local)");
    }

    #[test]
    fn test_timezone_offset() {
        assert_eq!(timezone_offset("ist"), 5.5);
        assert_eq!(timezone_offset("Mars"), 0.0);
    }
}
