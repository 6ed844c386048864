//! Letter grades relative to the channel baseline

use serde::Serialize;
use std::fmt;

/// Ratio thresholds (group mean views / baseline mean views)
pub const S_RATIO: f64 = 2.0;
pub const A_RATIO: f64 = 1.2;
pub const B_RATIO: f64 = 0.8;
pub const C_RATIO: f64 = 0.4;

/// Days after the group's last publish during which a low ratio is `WAIT`, not `F`
pub const GRACE_PERIOD_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Grade {
    S,
    A,
    B,
    C,
    #[serde(rename = "WAIT")]
    Wait,
    F,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::S => "S",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::Wait => "WAIT",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grade a group.
///
/// With no baseline (nothing has views yet) any group with views is `S`
/// and the rest wait.
pub fn grade(avg_views: f64, baseline: f64, days_old: i64) -> Grade {
    if baseline <= 0.0 {
        return if avg_views > 0.0 { Grade::S } else { Grade::Wait };
    }

    let ratio = avg_views / baseline;
    if ratio >= S_RATIO {
        Grade::S
    } else if ratio >= A_RATIO {
        Grade::A
    } else if ratio >= B_RATIO {
        Grade::B
    } else if ratio >= C_RATIO {
        Grade::C
    } else if days_old < GRACE_PERIOD_DAYS {
        Grade::Wait
    } else {
        Grade::F
    }
}

/// Retention fraction bucketed for the scoreboard
pub fn retention_band(retention: f64) -> &'static str {
    if retention >= 0.8 {
        "High"
    } else if retention >= 0.5 {
        "Mid"
    } else if retention > 0.0 {
        "Low"
    } else {
        "-"
    }
}
