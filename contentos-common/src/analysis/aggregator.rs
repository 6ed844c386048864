//! Per-ingredient aggregation over the `projects` mirror
//!
//! Every dimension groups on the raw stored string. Records without a value
//! for a dimension are left out of that dimension only. Means follow SQL
//! `AVG`: missing numbers are skipped and an empty mean is zero.

use super::grading::{grade, Grade};
use crate::db::ProjectRecord;
use crate::time::days_since;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Categorical ingredient dimensions of a kit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngredientKind {
    HookType,
    Theme,
    AudioStyle,
    VisualStyle,
    PhysicsType,
}

impl IngredientKind {
    pub const ALL: [IngredientKind; 5] = [
        IngredientKind::HookType,
        IngredientKind::Theme,
        IngredientKind::AudioStyle,
        IngredientKind::VisualStyle,
        IngredientKind::PhysicsType,
    ];

    /// Dimensions used by scoring and deep analysis
    pub const CORE: [IngredientKind; 4] = [
        IngredientKind::HookType,
        IngredientKind::Theme,
        IngredientKind::AudioStyle,
        IngredientKind::VisualStyle,
    ];

    /// Column name in `projects`
    pub fn column(&self) -> &'static str {
        match self {
            IngredientKind::HookType => "hook_type",
            IngredientKind::Theme => "theme",
            IngredientKind::AudioStyle => "audio_style",
            IngredientKind::VisualStyle => "visual_style",
            IngredientKind::PhysicsType => "physics_type",
        }
    }

    /// Scoreboard section title
    pub fn title(&self) -> &'static str {
        match self {
            IngredientKind::HookType => "Hook Types",
            IngredientKind::Theme => "Themes",
            IngredientKind::AudioStyle => "Audio Styles",
            IngredientKind::VisualStyle => "Visual Styles",
            IngredientKind::PhysicsType => "Physics Types",
        }
    }

    /// Console heading, e.g. `HOOK TYPE`
    pub fn heading(&self) -> String {
        self.column().to_uppercase().replace('_', " ")
    }

    pub fn value<'a>(&self, record: &'a ProjectRecord) -> Option<&'a str> {
        match self {
            IngredientKind::HookType => record.hook_type.as_deref(),
            IngredientKind::Theme => record.theme.as_deref(),
            IngredientKind::AudioStyle => record.audio_style.as_deref(),
            IngredientKind::VisualStyle => record.visual_style.as_deref(),
            IngredientKind::PhysicsType => record.physics_type.as_deref(),
        }
    }
}

impl fmt::Display for IngredientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Running sums behind a mean that skips missing values
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Mean {
    sum: f64,
    n: usize,
}

impl Mean {
    pub(crate) fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.n += 1;
        }
    }

    pub(crate) fn count(&self) -> usize {
        self.n
    }

    pub(crate) fn value(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.sum / self.n as f64
        }
    }
}

/// Channel-wide reference recomputed on every run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelBaseline {
    /// Records with positive 7-day views
    pub total_videos: usize,
    pub avg_views: f64,
}

impl ChannelBaseline {
    pub fn from_records(records: &[ProjectRecord]) -> Self {
        let mut mean = Mean::default();
        for views in records.iter().filter_map(|r| r.views_7d).filter(|v| *v > 0) {
            mean.push(Some(views as f64));
        }
        Self {
            total_videos: mean.count(),
            avg_views: mean.value(),
        }
    }
}

/// Aggregate of one ingredient value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientStats {
    pub kind: IngredientKind,
    pub value: String,
    pub count: usize,
    pub avg_views: f64,
    pub avg_retention: f64,
    /// Maximum stored publish string in the group
    pub last_published: Option<String>,
    pub days_old: i64,
    pub grade: Grade,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientSection {
    pub kind: IngredientKind,
    /// Descending by mean views
    pub rows: Vec<IngredientStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientReport {
    pub baseline: ChannelBaseline,
    pub sections: Vec<IngredientSection>,
}

/// Top and bottom performers across every dimension
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendations<'a> {
    pub adopt: Vec<&'a IngredientStats>,
    pub drop: Vec<&'a IngredientStats>,
}

/// Values below this mean are candidates to drop
pub const DROP_VIEWS_THRESHOLD: f64 = 200.0;

impl IngredientReport {
    /// True when no record carries any ingredient
    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.rows.is_empty())
    }

    pub fn recommendations(&self) -> Recommendations<'_> {
        let mut ranked: Vec<&IngredientStats> = self
            .sections
            .iter()
            .flat_map(|s| s.rows.iter())
            .filter(|row| row.avg_views != 0.0)
            .collect();
        ranked.sort_by(|a, b| b.avg_views.total_cmp(&a.avg_views));

        let adopt = ranked.iter().take(3).copied().collect();
        let drop = ranked
            .iter()
            .skip(ranked.len().saturating_sub(2))
            .filter(|row| row.avg_views < DROP_VIEWS_THRESHOLD)
            .copied()
            .collect();

        Recommendations { adopt, drop }
    }
}

#[derive(Default)]
struct Group {
    count: usize,
    views: Mean,
    retention: Mean,
    last_published: Option<String>,
}

/// Group, average and grade every ingredient dimension
pub fn aggregate(records: &[ProjectRecord], today: NaiveDate) -> IngredientReport {
    let baseline = ChannelBaseline::from_records(records);

    let sections = IngredientKind::ALL
        .iter()
        .map(|&kind| {
            let mut groups: BTreeMap<&str, Group> = BTreeMap::new();
            for record in records {
                let Some(value) = kind.value(record) else {
                    continue;
                };
                let group = groups.entry(value).or_default();
                group.count += 1;
                group.views.push(record.views_7d.map(|v| v as f64));
                group.retention.push(record.retention_avg);
                if let Some(published) = record.published_at.as_deref() {
                    if group.last_published.as_deref().map_or(true, |prev| published > prev) {
                        group.last_published = Some(published.to_string());
                    }
                }
            }

            let mut rows: Vec<IngredientStats> = groups
                .into_iter()
                .map(|(value, group)| {
                    let avg_views = group.views.value();
                    let days_old = days_since(group.last_published.as_deref(), today);
                    IngredientStats {
                        kind,
                        value: value.to_string(),
                        count: group.count,
                        avg_views,
                        avg_retention: group.retention.value(),
                        last_published: group.last_published,
                        days_old,
                        grade: grade(avg_views, baseline.avg_views, days_old),
                    }
                })
                .collect();
            // Stable: ties stay in value order
            rows.sort_by(|a, b| b.avg_views.total_cmp(&a.avg_views));

            IngredientSection { kind, rows }
        })
        .collect();

    IngredientReport { baseline, sections }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record(
        id: &str,
        hook: Option<&str>,
        theme: Option<&str>,
        views: Option<i64>,
        published: Option<&str>,
    ) -> ProjectRecord {
        ProjectRecord {
            id: id.to_string(),
            name: format!("kit_{}", id),
            hook_type: hook.map(str::to_string),
            theme: theme.map(str::to_string),
            views_7d: views,
            published_at: published.map(str::to_string),
            ..Default::default()
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_baseline_counts_only_positive_views() {
        let records = vec![
            record("001", None, None, Some(100), None),
            record("002", None, None, Some(300), None),
            record("003", None, None, Some(0), None),
            record("004", None, None, None, None),
        ];
        let baseline = ChannelBaseline::from_records(&records);
        assert_eq!(baseline.total_videos, 2);
        assert_eq!(baseline.avg_views, 200.0);
    }

    #[test]
    fn test_groups_by_raw_value_and_grades_against_baseline() {
        let records = vec![
            record("001", Some("Question"), Some("loop"), Some(400), Some("2025-01-01")),
            record("002", Some("question"), Some("loop"), Some(100), Some("2025-01-02")),
            record("003", Some("Question"), None, Some(200), Some("2025-01-03T10:00:00Z")),
            record("004", None, Some("cinematic"), Some(20), Some("2025-03-01")),
        ];
        let report = aggregate(&records, day("2025-03-05"));
        assert_eq!(report.baseline.total_videos, 4);
        assert_eq!(report.baseline.avg_views, 180.0);

        let hooks = &report.sections[0];
        assert_eq!(hooks.kind, IngredientKind::HookType);
        assert_eq!(hooks.rows.len(), 2);
        assert_eq!(hooks.rows[0].value, "Question");
        assert_eq!(hooks.rows[0].count, 2);
        assert_eq!(hooks.rows[0].avg_views, 300.0);
        assert_eq!(hooks.rows[0].last_published.as_deref(), Some("2025-01-03T10:00:00Z"));
        assert_eq!(hooks.rows[0].grade, Grade::A);
        assert_eq!(hooks.rows[1].value, "question");

        let themes = &report.sections[1];
        assert_eq!(themes.rows[0].value, "loop");
        assert_eq!(themes.rows[0].count, 2);
        // 20 / 180 is below C but was published 4 days ago
        assert_eq!(themes.rows[1].value, "cinematic");
        assert_eq!(themes.rows[1].grade, Grade::Wait);
    }

    #[test]
    fn test_missing_numbers_are_skipped_and_bad_dates_are_old() {
        let records = vec![
            record("001", Some("Shock"), None, None, Some("not a date")),
            record("002", Some("Shock"), None, Some(0), None),
            record("003", Some("Question"), None, Some(500), None),
        ];
        let report = aggregate(&records, day("2025-03-05"));
        let shock = report.sections[0]
            .rows
            .iter()
            .find(|r| r.value == "Shock")
            .unwrap();
        assert_eq!(shock.count, 2);
        assert_eq!(shock.avg_views, 0.0);
        assert_eq!(shock.avg_retention, 0.0);
        assert_eq!(shock.days_old, 999);
        assert_eq!(shock.grade, Grade::F);
    }

    #[test]
    fn test_recommendations() {
        let records = vec![
            record("001", Some("A"), Some("t1"), Some(1000), None),
            record("002", Some("B"), Some("t2"), Some(150), None),
            record("003", Some("C"), Some("t3"), Some(50), None),
        ];
        let report = aggregate(&records, day("2025-03-05"));
        let recs = report.recommendations();

        assert_eq!(recs.adopt.len(), 3);
        assert_eq!(recs.adopt[0].avg_views, 1000.0);
        assert_eq!(recs.drop.len(), 2);
        assert!(recs.drop.iter().all(|r| r.avg_views == 50.0));
    }

    #[test]
    fn test_empty_report() {
        let report = aggregate(&[], day("2025-03-05"));
        assert!(report.is_empty());
        assert_eq!(report.baseline.avg_views, 0.0);
        assert!(report.recommendations().adopt.is_empty());
    }
}
