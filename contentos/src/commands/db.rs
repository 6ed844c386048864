//! `contentos db` - SQLite mirror, ingredient analysis and exports

use anyhow::{Context, Result};
use clap::Subcommand;
use contentos_common::analysis::{
    aggregate, combos, deep_analysis, render_console, write_scoreboard, IngredientReport,
};
use contentos_common::db::{latest_metrics, load_projects, ProjectRecord};
use contentos_common::files::write_json;
use contentos_common::{time, ChannelContext};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Export file written under `analytics/`
pub const EXPORT_FILE: &str = "contentos_export.json";

const COMBO_DISPLAY_LIMIT: usize = 10;

#[derive(Debug, Subcommand)]
pub enum DbCommand {
    /// Sync all projects to database
    Sync,
    /// Analyze ingredient performance
    Analyze {
        /// Include retention and watch time from video metrics
        #[arg(long)]
        deep: bool,
    },
    /// Query projects
    Query,
    /// Export projects to JSON
    Export,
    /// Best performing ingredient combinations
    Combos,
}

pub async fn run(root: &Path, command: DbCommand) -> Result<()> {
    let ctx = super::active_context(root)?;
    match command {
        DbCommand::Sync => {
            println!(">> Syncing projects to database...");
            super::sync_database(&ctx).await?;
        }
        DbCommand::Analyze { deep: false } => {
            analyze(&ctx).await?;
        }
        DbCommand::Analyze { deep: true } => analyze_deep(&ctx).await?,
        DbCommand::Query => query(&ctx).await?,
        DbCommand::Export => {
            let path = export(&ctx).await?;
            println!(">> Exported to {}", path.display());
        }
        DbCommand::Combos => show_combos(&ctx).await?,
    }
    Ok(())
}

async fn load(ctx: &ChannelContext) -> Result<Vec<ProjectRecord>> {
    let pool = super::open_database(ctx).await?;
    let records = load_projects(&pool).await.context("Failed to read projects")?;
    pool.close().await;
    Ok(records)
}

/// Aggregate, print and persist the ranking document
pub async fn analyze(ctx: &ChannelContext) -> Result<IngredientReport> {
    let records = load(ctx).await?;
    let report = aggregate(&records, time::today());

    println!(
        "Channel Baseline: {:.0} avg views (over {} videos)\n",
        report.baseline.avg_views, report.baseline.total_videos
    );
    if report.is_empty() {
        println!("[!] No performance data yet.");
        println!("   1. Add kit.yaml to your projects with ingredients");
        println!("   2. Publish videos and add performance data");
        println!("   3. Run `contentos db sync`");
        return Ok(report);
    }

    println!(">> INGREDIENT PERFORMANCE ANALYSIS\n");
    println!("{}", "=".repeat(60));
    print!("{}", render_console(&report));

    let scoreboard = ctx.scoreboard_path();
    if write_scoreboard(&scoreboard, &report) {
        println!("\n>> Scoreboard updated: {}", scoreboard.display());
    } else {
        println!("\n[!] Failed to update scoreboard {}", scoreboard.display());
    }

    println!("\n{}", "=".repeat(60));
    println!("\n[?] RECOMMENDATIONS\n");
    let recommendations = report.recommendations();
    if recommendations.adopt.is_empty() {
        println!("Not enough data yet. Publish more videos!");
        return Ok(report);
    }
    println!(">> ADOPT (Top performers):");
    for row in &recommendations.adopt {
        println!("   * {}: {} ({:.0} avg views)", row.kind.column(), row.value, row.avg_views);
    }
    println!("\n>> DROP (Low performers):");
    for row in &recommendations.drop {
        println!("   * {}: {} ({:.0} avg views)", row.kind.column(), row.value, row.avg_views);
    }
    Ok(report)
}

async fn analyze_deep(ctx: &ChannelContext) -> Result<()> {
    let pool = super::open_database(ctx).await?;
    let records = load_projects(&pool).await?;
    let latest = latest_metrics(&pool).await?;
    pool.close().await;

    println!(">> DEEP INGREDIENT ANALYSIS (with retention/watch time)\n");
    let sections = deep_analysis(&records, &latest);
    if sections.iter().all(|s| s.rows.is_empty()) {
        println!("[!] No data. Run 'contentos sync analytics' first.");
        return Ok(());
    }

    for section in sections {
        println!("\n### {}", section.kind.heading());
        println!(
            "{:<20} {:<8} {:<12} {:<12} {:<10}",
            "Ingredient", "Videos", "Avg Views", "Retention%", "Watch Hrs"
        );
        println!("{}", "-".repeat(65));
        for row in section.rows {
            let name: String = row.value.chars().take(20).collect();
            println!(
                "{:<20} {:<8} {:<12.0} {:<12.1} {:<10.2}",
                name, row.count, row.avg_views, row.avg_retention_pct, row.avg_watch_hours
            );
        }
    }
    println!("\n[TIP] Use 'db combos' to find best ingredient combinations.");
    Ok(())
}

async fn query(ctx: &ChannelContext) -> Result<()> {
    let records = load(ctx).await?;
    if records.is_empty() {
        println!("[!] No projects in database. Run `contentos db sync` first.");
        return Ok(());
    }

    println!("PROJECTS ({} total)\n", records.len());
    println!(
        "{:<6} {:<25} {:<12} {:<10} {:<6} Combo",
        "ID", "Name", "Status", "Views 7d", "Rating"
    );
    println!("{}", "=".repeat(80));
    for record in &records {
        let name: String = record.name.chars().take(24).collect();
        let combo: String = record.combo_label().chars().take(20).collect();
        let views = record
            .views_7d
            .map_or_else(|| "-".to_string(), |v| v.to_string());
        println!(
            "{:<6} {:<25} {:<12} {:<10} {:<6} {}",
            record.id,
            name,
            record.status.as_deref().unwrap_or("-"),
            views,
            record.overall_rating.as_deref().unwrap_or("-"),
            combo
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct Export<'a> {
    channel: &'a str,
    exported_at: String,
    projects: &'a [ProjectRecord],
}

/// Write every project row to `analytics/contentos_export.json`
pub async fn export(ctx: &ChannelContext) -> Result<PathBuf> {
    let records = load(ctx).await?;
    let path = ctx.analytics_path().join(EXPORT_FILE);
    let document = Export {
        channel: ctx.display_name(),
        exported_at: time::now().to_rfc3339(),
        projects: &records,
    };
    write_json(&path, &document)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

async fn show_combos(ctx: &ChannelContext) -> Result<()> {
    let records = load(ctx).await?;
    println!(">> INGREDIENT COMBINATION ANALYSIS\n");

    let stats = combos(&records);
    let Some(best) = stats.first() else {
        println!("[!] No performance data. Run 'contentos sync' first.");
        return Ok(());
    };

    println!("{:<45} {:<8} {:<10}", "Combo", "Videos", "Avg Views");
    println!("{}", "-".repeat(65));
    for combo in stats.iter().take(COMBO_DISPLAY_LIMIT) {
        let label: String = combo.combo.chars().take(45).collect();
        println!("{:<45} {:<8} {:<10.0}", label, combo.count, combo.avg_views);
    }
    println!("\n[RECOMMENDED] Best combo: {}", best.combo);
    println!("   Example: {}", best.example);
    Ok(())
}
