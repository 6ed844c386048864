//! Combination, predictive and deep views over records with views

use super::aggregator::{IngredientKind, Mean};
use crate::db::{ProjectRecord, VideoMetric};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Rows shown by `db combos` and `kit suggest --predict`
pub const TOP_N: usize = 10;

/// Baseline used for scoring when no record has views yet
pub const DEFAULT_SCORE_BASELINE: f64 = 100.0;

/// Scores above this are flagged as outliers
pub const OUTLIER_SCORE: f64 = 200.0;

/// Label for a missing ingredient in combos and deep analysis
pub const UNKNOWN_VALUE: &str = "Unknown";

fn has_views(record: &ProjectRecord) -> bool {
    record.views_7d.is_some_and(|v| v > 0)
}

fn views(record: &ProjectRecord) -> f64 {
    record.views_7d.unwrap_or(0) as f64
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComboStats {
    /// `hook + theme + audio`
    pub combo: String,
    pub count: usize,
    pub avg_views: f64,
    /// Name of the first kit carrying the combination
    pub example: String,
}

/// Group records with views by hook, theme and audio; best first
pub fn combos(records: &[ProjectRecord]) -> Vec<ComboStats> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, (Mean, usize, String)> = HashMap::new();

    for record in records.iter().filter(|r| has_views(r)) {
        let signature = [
            IngredientKind::HookType,
            IngredientKind::Theme,
            IngredientKind::AudioStyle,
        ]
        .iter()
        .map(|kind| kind.value(record).unwrap_or(UNKNOWN_VALUE))
        .collect::<Vec<_>>()
        .join(" + ");

        let group = groups.entry(signature.clone()).or_insert_with(|| {
            order.push(signature);
            (Mean::default(), 0, record.name.clone())
        });
        group.0.push(Some(views(record)));
        group.1 += 1;
    }

    let mut stats: Vec<ComboStats> = order
        .into_iter()
        .filter_map(|combo| {
            groups.remove(&combo).map(|(mean, count, example)| ComboStats {
                combo,
                count,
                avg_views: mean.value(),
                example,
            })
        })
        .collect();
    stats.sort_by(|a, b| b.avg_views.total_cmp(&a.avg_views));
    stats
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientScore {
    pub kind: IngredientKind,
    pub value: String,
    /// Percent of the baseline; 100 is average
    pub score: f64,
    pub avg_views: f64,
    pub count: usize,
}

impl IngredientScore {
    /// `150%`, or `250%*` for outliers
    pub fn score_label(&self) -> String {
        if self.score > OUTLIER_SCORE {
            format!("{:.0}%*", self.score)
        } else {
            format!("{:.0}%", self.score)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictedScores {
    pub baseline: f64,
    /// Every core ingredient value, highest score first
    pub scores: Vec<IngredientScore>,
}

impl PredictedScores {
    pub fn top(&self) -> &[IngredientScore] {
        &self.scores[..self.scores.len().min(TOP_N)]
    }

    pub fn recommended(&self) -> Option<&IngredientScore> {
        self.scores.first()
    }
}

fn grouped_means<'a>(
    records: &'a [ProjectRecord],
    kind: IngredientKind,
) -> BTreeMap<&'a str, Mean> {
    let mut groups: BTreeMap<&str, Mean> = BTreeMap::new();
    for record in records.iter().filter(|r| has_views(r)) {
        if let Some(value) = kind.value(record) {
            groups.entry(value).or_default().push(Some(views(record)));
        }
    }
    groups
}

/// Score every core ingredient value against the channel baseline
pub fn predict_scores(records: &[ProjectRecord]) -> PredictedScores {
    let mut baseline = Mean::default();
    for record in records.iter().filter(|r| has_views(r)) {
        baseline.push(Some(views(record)));
    }
    let baseline = if baseline.count() == 0 {
        DEFAULT_SCORE_BASELINE
    } else {
        baseline.value()
    };

    let mut scores: Vec<IngredientScore> = IngredientKind::CORE
        .iter()
        .flat_map(|&kind| {
            grouped_means(records, kind)
                .into_iter()
                .map(move |(value, mean)| IngredientScore {
                    kind,
                    value: value.to_string(),
                    score: mean.value() / baseline * 100.0,
                    avg_views: mean.value(),
                    count: mean.count(),
                })
        })
        .collect();
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));

    PredictedScores { baseline, scores }
}

/// Best value of one dimension by mean views, over records with views
pub fn best_value(records: &[ProjectRecord], kind: IngredientKind) -> Option<(String, f64)> {
    grouped_means(records, kind)
        .into_iter()
        .map(|(value, mean)| (value.to_string(), mean.value()))
        .fold(None, |best: Option<(String, f64)>, candidate| match best {
            Some(b) if b.1 >= candidate.1 => Some(b),
            _ => Some(candidate),
        })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeepStats {
    pub value: String,
    pub count: usize,
    pub avg_views: f64,
    /// Mean of nonzero `avg_percentage_viewed`
    pub avg_retention_pct: f64,
    /// Mean of nonzero `watch_time_hours`
    pub avg_watch_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeepSection {
    pub kind: IngredientKind,
    pub rows: Vec<DeepStats>,
}

/// Per-dimension views, retention and watch time from each kit's latest snapshot
pub fn deep_analysis(
    records: &[ProjectRecord],
    latest: &HashMap<String, VideoMetric>,
) -> Vec<DeepSection> {
    let nonzero = |v: Option<f64>| v.filter(|x| *x != 0.0);

    IngredientKind::CORE
        .iter()
        .map(|&kind| {
            let mut groups: BTreeMap<&str, (Mean, Mean, Mean)> = BTreeMap::new();
            for record in records.iter().filter(|r| has_views(r)) {
                let value = kind.value(record).unwrap_or(UNKNOWN_VALUE);
                let metric = latest.get(&record.id);
                let group = groups.entry(value).or_default();
                group.0.push(Some(views(record)));
                group.1.push(nonzero(metric.and_then(|m| m.avg_percentage_viewed)));
                group.2.push(nonzero(metric.and_then(|m| m.watch_time_hours)));
            }

            let mut rows: Vec<DeepStats> = groups
                .into_iter()
                .map(|(value, (views, retention, watch))| DeepStats {
                    value: value.to_string(),
                    count: views.count(),
                    avg_views: views.value(),
                    avg_retention_pct: retention.value(),
                    avg_watch_hours: watch.value(),
                })
                .collect();
            rows.sort_by(|a, b| b.avg_views.total_cmp(&a.avg_views));

            DeepSection { kind, rows }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregator::tests::record;

    fn with_audio(mut r: ProjectRecord, audio: &str) -> ProjectRecord {
        r.audio_style = Some(audio.to_string());
        r
    }

    #[test]
    fn test_combos_skip_records_without_views() {
        let records = vec![
            with_audio(record("001", Some("Question"), Some("loop"), Some(300), None), "ASMR_Purr"),
            with_audio(record("002", Some("Question"), Some("loop"), Some(100), None), "ASMR_Purr"),
            record("003", Some("Shock"), None, Some(900), None),
            record("004", Some("Shock"), Some("loop"), Some(0), None),
        ];
        let stats = combos(&records);

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].combo, "Shock + Unknown + Unknown");
        assert_eq!(stats[0].avg_views, 900.0);
        assert_eq!(stats[1].combo, "Question + loop + ASMR_Purr");
        assert_eq!(stats[1].count, 2);
        assert_eq!(stats[1].avg_views, 200.0);
        assert_eq!(stats[1].example, "kit_001");
    }

    #[test]
    fn test_predict_scores_relative_to_baseline() {
        let records = vec![
            record("001", Some("Question"), Some("loop"), Some(300), None),
            record("002", Some("Shock"), Some("loop"), Some(100), None),
            record("003", None, None, Some(0), None),
        ];
        let predicted = predict_scores(&records);
        assert_eq!(predicted.baseline, 200.0);

        let top = predicted.recommended().unwrap();
        assert_eq!(top.value, "Question");
        assert_eq!(top.score, 150.0);
        assert_eq!(top.score_label(), "150%");
        assert_eq!(predicted.scores.len(), 3);
    }

    #[test]
    fn test_predict_defaults_baseline_without_data() {
        let predicted = predict_scores(&[record("001", Some("Question"), None, None, None)]);
        assert_eq!(predicted.baseline, DEFAULT_SCORE_BASELINE);
        assert!(predicted.scores.is_empty());
        assert!(predicted.recommended().is_none());
    }

    #[test]
    fn test_outlier_label() {
        let score = IngredientScore {
            kind: IngredientKind::Theme,
            value: "loop".into(),
            score: 250.0,
            avg_views: 500.0,
            count: 1,
        };
        assert_eq!(score.score_label(), "250%*");
    }

    #[test]
    fn test_best_value() {
        let records = vec![
            record("001", None, Some("loop"), Some(300), None),
            record("002", None, Some("cinematic"), Some(700), None),
        ];
        assert_eq!(
            best_value(&records, IngredientKind::Theme),
            Some(("cinematic".to_string(), 700.0))
        );
        assert_eq!(best_value(&records, IngredientKind::HookType), None);
    }

    #[test]
    fn test_deep_analysis_uses_latest_metrics_and_skips_zero() {
        let records = vec![
            record("001", Some("Question"), None, Some(300), None),
            record("002", Some("Question"), None, Some(100), None),
            record("003", None, None, Some(50), None),
        ];
        let mut latest = HashMap::new();
        latest.insert(
            "001".to_string(),
            VideoMetric {
                project_id: "001".into(),
                snapshot_date: "2025-01-01".into(),
                avg_percentage_viewed: Some(80.0),
                watch_time_hours: Some(0.0),
                ..Default::default()
            },
        );

        let sections = deep_analysis(&records, &latest);
        assert_eq!(sections.len(), 4);
        let hooks = &sections[0].rows;
        assert_eq!(hooks[0].value, "Question");
        assert_eq!(hooks[0].count, 2);
        assert_eq!(hooks[0].avg_views, 200.0);
        assert_eq!(hooks[0].avg_retention_pct, 80.0);
        assert_eq!(hooks[0].avg_watch_hours, 0.0);
        assert_eq!(hooks[1].value, UNKNOWN_VALUE);
    }
}
