//! Console tables and the `SCOREBOARD.md` ranking document

use super::aggregator::IngredientReport;
use super::grading::retention_band;
use crate::files::write_atomic;
use std::fmt::Write as _;
use std::path::Path;
use tracing::{info, warn};

const SCOREBOARD_HEADER: &str = "# Strategy Scoreboard\n\n> Auto-updated via `contentos db analyze`\n\n---\n\n## INGREDIENT RANKINGS\n\n";

const SCOREBOARD_FOOTER: &str = "---\n\n## INGREDIENTS TO DROP\n\n*   **Global Rule**: Drop 'F' tier ingredients after 3 failures.\n";

/// Round to a whole number and group thousands with commas
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0.0 {
        out.insert(0, '-');
    }
    out
}

/// Per-dimension console table
pub fn render_console(report: &IngredientReport) -> String {
    let mut out = String::new();
    for section in report.sections.iter().filter(|s| !s.rows.is_empty()) {
        let _ = writeln!(out, "\n### {}", section.kind.heading());
        let _ = writeln!(
            out,
            "{:<20} {:<8} {:<12} {:<10} Grade",
            "Ingredient", "Videos", "Avg Views", "Retention"
        );
        let _ = writeln!(out, "{}", "-".repeat(60));
        for row in &section.rows {
            let _ = writeln!(
                out,
                "{:<20} {:<8} {:<12.0} {:<10.2} [{}]",
                row.value, row.count, row.avg_views, row.avg_retention, row.grade
            );
        }
    }
    out
}

/// Markdown ranking document
pub fn render_scoreboard(report: &IngredientReport) -> String {
    let mut out = String::from(SCOREBOARD_HEADER);
    for section in report.sections.iter().filter(|s| !s.rows.is_empty()) {
        let _ = writeln!(out, "### {}", section.kind.title());
        out.push_str("| Rank | Ingredient | Videos | Avg Views | Retention | Grade |\n");
        out.push_str("|---|---|---|---|---|---|\n");
        for (rank, row) in section.rows.iter().enumerate() {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} |",
                rank + 1,
                row.value,
                row.count,
                format_thousands(row.avg_views),
                retention_band(row.avg_retention),
                row.grade
            );
        }
        out.push('\n');
    }
    out.push_str(SCOREBOARD_FOOTER);
    out
}

/// Rewrite the scoreboard. Failure is logged and reported as `false`.
pub fn write_scoreboard(path: &Path, report: &IngredientReport) -> bool {
    match write_atomic(path, render_scoreboard(report).as_bytes()) {
        Ok(()) => {
            info!(path = %path.display(), "Scoreboard updated");
            true
        }
        Err(e) => {
            warn!("Failed to update scoreboard {}: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate;
    use crate::analysis::aggregator::tests::record;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample_report() -> IngredientReport {
        let mut strong = record("001", Some("Question"), Some("loop"), Some(2500), Some("2025-01-01"));
        strong.retention_avg = Some(0.85);
        let weak = record("002", Some("Shock"), Some("loop"), Some(100), Some("2025-01-01"));
        aggregate(&[strong, weak], NaiveDate::from_ymd_opt(2025, 3, 1).unwrap())
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.4), "999");
        assert_eq!(format_thousands(1000.0), "1,000");
        assert_eq!(format_thousands(1234567.6), "1,234,568");
        assert_eq!(format_thousands(-1500.0), "-1,500");
    }

    #[test]
    fn test_scoreboard_layout() {
        let text = render_scoreboard(&sample_report());

        assert!(text.starts_with("# Strategy Scoreboard\n"));
        assert!(text.contains("### Hook Types\n| Rank | Ingredient | Videos | Avg Views | Retention | Grade |\n|---|---|---|---|---|---|\n"));
        assert!(text.contains("| 1 | Question | 1 | 2,500 | High | A |\n"));
        assert!(text.contains("| 2 | Shock | 1 | 100 | - | F |\n"));
        assert!(text.contains("| 1 | loop | 2 | 1,300 | High | B |\n"));
        // Dimensions without data get no section
        assert!(!text.contains("### Audio Styles"));
        assert!(text.ends_with("Drop 'F' tier ingredients after 3 failures.\n"));
    }

    #[test]
    fn test_console_table_marks_grades() {
        let text = render_console(&sample_report());
        assert!(text.contains("### HOOK TYPE"));
        assert!(text.contains("[A]"));
    }

    #[test]
    fn test_write_scoreboard_reports_failure() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("strategy");
        std::fs::write(&blocker, "not a dir").unwrap();

        assert!(!write_scoreboard(&blocker.join("SCOREBOARD.md"), &sample_report()));

        let ok_path = temp.path().join("strategies").join("SCOREBOARD.md");
        assert!(write_scoreboard(&ok_path, &sample_report()));
        assert!(ok_path.exists());
    }
}
