//! `contentos sync` - pull upload statistics into kits and the database

use crate::services::title_matcher::best_match;
use crate::services::{VideoStats, YouTubeClient};
use anyhow::{anyhow, bail, Context, Result};
use chrono::{Duration, NaiveDate};
use clap::{Args, Subcommand};
use contentos_common::analysis::format_thousands;
use contentos_common::db::{insert_metric, load_projects, video_project_map, VideoMetric};
use contentos_common::files::write_atomic;
use contentos_common::kit::{is_linked, KitDocument, KitEntry, KitLedger, KitStatus};
use contentos_common::{time, ChannelContext, ContextManager};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_COUNT: usize = 10;
pub const DEEP_COUNT: usize = 50;
/// Views above which a ledger row is marked as a hit
pub const HIT_VIEWS: i64 = 1000;
/// Days covered by `sync analytics`
pub const ANALYTICS_WINDOW_DAYS: i64 = 28;
/// Recent uploads checked by `sync analytics` besides linked kits
const ANALYTICS_RECENT_UPLOADS: usize = 50;

#[derive(Debug, Args)]
pub struct SyncArgs {
    #[command(subcommand)]
    pub action: Option<SyncAction>,
    /// Fetch the last 50 uploads
    #[arg(long)]
    pub deep: bool,
    /// Number of uploads to fetch
    #[arg(long)]
    pub count: Option<usize>,
    /// Sync every channel
    #[arg(long = "all")]
    pub all_channels: bool,
}

#[derive(Debug, Subcommand)]
pub enum SyncAction {
    /// Store 28-day analytics for linked kits
    Analytics,
    /// Import a YouTube Studio CSV export
    ImportStudio {
        /// Path to the exported CSV
        csv: PathBuf,
    },
}

/// Uploads to fetch for the given flags; `--count` wins over `--deep`
pub fn fetch_count(deep: bool, count: Option<usize>) -> usize {
    count.unwrap_or(if deep { DEEP_COUNT } else { DEFAULT_COUNT })
}

/// `strategy/<display name>_analytics.md`
pub fn ledger_path(ctx: &ChannelContext) -> PathBuf {
    ctx.strategy_path()
        .join(format!("{}_analytics.md", ctx.display_name().to_lowercase()))
}

/// Markdown ledger of the fetched uploads
pub fn render_ledger(channel: &str, videos: &[VideoStats]) -> String {
    let mut out = format!(
        "# {} Analytics Ledger\n\n| ID | Title | Published | Views | Likes | Score |\n|---|---|---|---|---|---|\n",
        channel
    );
    for video in videos {
        let score = if video.views > HIT_VIEWS { "🟢" } else { "⚪" };
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            video.id,
            video.short_title(),
            video.published_date(),
            format_thousands(video.views as f64),
            format_thousands(video.likes as f64),
            score
        ));
    }
    out
}

/// Link and refresh one kit document; returns whether anything changed
fn update_kit(document: &mut KitDocument, slug: &str, videos: &[VideoStats]) -> Result<bool> {
    let mut main = document
        .video_id
        .as_deref()
        .and_then(|id| videos.iter().find(|v| v.id == id));

    if main.is_none() && !is_linked(document.video_id.as_deref()) {
        if let Some((video, score)) = best_match(slug, videos, VideoStats::short_title) {
            println!(
                "   * Auto-linked '{}' -> '{}...' ({:.2})",
                slug,
                video.title.chars().take(20).collect::<String>(),
                score
            );
            document.video_id = Some(video.id.clone());
            main = Some(video);
        }
    }

    let short = document
        .video_id_short
        .as_deref()
        .and_then(|id| videos.iter().find(|v| v.id == id));

    if let Some(video) = main {
        let performance = document.performance_mut();
        performance.views_7d = Some(video.views);
        performance.likes = Some(video.likes);
        performance.synced_at = Some(video.published_date().to_string());
        document.transition_to(KitStatus::Published)?;
    }
    if let Some(video) = short {
        let performance = document.performance_short_mut();
        performance.views_7d = Some(video.views);
        performance.likes = Some(video.likes);
        performance.synced_at = Some(video.published_date().to_string());
    }
    Ok(main.is_some() || short.is_some())
}

/// Match uploads to kits, write their statistics and return how many kits changed
pub fn apply_uploads(kits: &[KitEntry], videos: &[VideoStats]) -> usize {
    let mut updated = 0;
    for kit in kits {
        let Some(mut document) = kit.document.clone() else {
            continue;
        };
        let changed = match update_kit(&mut document, &kit.slug, videos) {
            Ok(changed) => changed,
            Err(e) => {
                warn!(kit = %kit.folder_name(), "Skipping kit: {}", e);
                continue;
            }
        };
        if !changed {
            continue;
        }
        match document.save(&kit.yaml_path()) {
            Ok(()) => updated += 1,
            Err(e) => warn!(kit = %kit.folder_name(), "Failed to save kit.yaml: {}", e),
        }
    }
    updated
}

/// Default sync for one channel
pub async fn sync_channel(ctx: &ChannelContext, client: &YouTubeClient, count: usize) -> Result<usize> {
    println!(">> Syncing {}...", ctx.display_name());
    let playlist = client
        .uploads_playlist_id()
        .await?
        .ok_or_else(|| anyhow!("Could not find the channel's uploads playlist"))?;
    let videos = client.recent_videos(&playlist, count).await?;

    println!(">> Found {} recent uploads", videos.len());
    for video in &videos {
        let title: String = video.title.chars().take(30).collect();
        println!("  * {}... -> {} views", title, format_thousands(video.views as f64));
    }

    let ledger = ledger_path(ctx);
    write_atomic(&ledger, render_ledger(ctx.display_name(), &videos).as_bytes())
        .with_context(|| format!("Failed to write {}", ledger.display()))?;
    println!(">> Ledger updated: {}", ledger.display());

    let kits = KitLedger::new(ctx.production_path()).list()?;
    let updated = apply_uploads(&kits, &videos);
    info!(channel = %ctx.name, videos = videos.len(), updated, "Sync complete");
    println!(">> Updated {} kit files.", updated);

    super::sync_database(ctx).await?;
    Ok(updated)
}

/// Counts reported by `sync import-studio`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Integer cell; thousands separators allowed, anything else → `None`
pub fn parse_count(text: &str) -> Option<i64> {
    text.replace(',', "").trim().parse().ok()
}

/// Decimal cell; thousands separators and `%` allowed
pub fn parse_decimal(text: &str) -> Option<f64> {
    text.replace(|c: char| c == ',' || c == '%', "").trim().parse().ok()
}

/// `M:SS` or `H:MM:SS` to seconds; other shapes → 0
pub fn parse_duration(text: &str) -> f64 {
    let parts: Option<Vec<f64>> = text
        .trim()
        .split(':')
        .map(|p| p.trim().parse::<f64>().ok())
        .collect();
    match parts.as_deref() {
        Some([m, s]) => m * 60.0 + s,
        Some([h, m, s]) => h * 3600.0 + m * 60.0 + s,
        _ => 0.0,
    }
}

/// Import a Studio content export; rows for videos not linked to a kit are skipped
pub async fn import_studio_csv(
    pool: &SqlitePool,
    csv_text: &str,
    video_map: &HashMap<String, String>,
    snapshot_date: &str,
) -> Result<ImportSummary> {
    let text = csv_text.trim_start_matches('\u{feff}');
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers().context("CSV has no header row")?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);

    let video_col = column("Video");
    let views_col = column("Views");
    let likes_col = column("Likes");
    let comments_col = column("Comments");
    let impressions_col = column("Impressions");
    let ctr_col = column("Impressions click-through rate (%)");
    let watch_col = column("Watch time (hours)");
    let subs_col = column("Subscribers");
    let duration_col = column("Average view duration");

    let mut summary = ImportSummary::default();
    for record in reader.records() {
        let record = record.context("Malformed CSV row")?;
        let cell = |col: Option<usize>, default: &'static str| {
            col.and_then(|i| record.get(i)).unwrap_or(default)
        };

        let video_id = cell(video_col, "").trim();
        let Some(project_id) = video_map.get(video_id) else {
            summary.skipped += 1;
            continue;
        };

        let metric = VideoMetric {
            project_id: project_id.clone(),
            snapshot_date: snapshot_date.to_string(),
            views: parse_count(cell(views_col, "0")),
            likes: parse_count(cell(likes_col, "0")),
            comments: parse_count(cell(comments_col, "0")),
            impressions: parse_count(cell(impressions_col, "0")),
            ctr: parse_decimal(cell(ctr_col, "0")),
            avg_view_duration: Some(parse_duration(cell(duration_col, "0:00"))),
            avg_percentage_viewed: None,
            watch_time_hours: parse_decimal(cell(watch_col, "0")),
            subscribers_gained: parse_count(cell(subs_col, "0")),
        };
        insert_metric(pool, &metric).await?;
        summary.imported += 1;
    }
    Ok(summary)
}

async fn import_studio(ctx: &ChannelContext, csv_path: &Path) -> Result<ImportSummary> {
    if !csv_path.is_file() {
        bail!("File not found: {}", csv_path.display());
    }
    let bytes = std::fs::read(csv_path)
        .with_context(|| format!("Failed to read {}", csv_path.display()))?;
    let text = String::from_utf8_lossy(&bytes);

    let pool = super::open_database(ctx).await?;
    let video_map = video_project_map(&pool).await?;
    let snapshot = time::today().format("%Y-%m-%d").to_string();
    let summary = import_studio_csv(&pool, &text, &video_map, &snapshot).await;
    pool.close().await;
    summary
}

/// Counts reported by `sync analytics`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AnalyticsSummary {
    pub fetched: usize,
    pub stored: usize,
    pub errors: usize,
}

/// `(start, end)` of the analytics window ending on `today`
pub fn analytics_window(today: NaiveDate) -> (String, String) {
    let start = today - Duration::days(ANALYTICS_WINDOW_DAYS);
    (
        start.format("%Y-%m-%d").to_string(),
        today.format("%Y-%m-%d").to_string(),
    )
}

struct AnalyticsTarget {
    video_id: String,
    label: String,
    project_id: Option<String>,
}

/// Fetch window analytics for linked kits and recent uploads; stores linked ones
pub async fn fetch_analytics(
    ctx: &ChannelContext,
    client: &YouTubeClient,
    today: NaiveDate,
) -> Result<AnalyticsSummary> {
    let pool = super::open_database(ctx).await?;
    let mut targets: Vec<AnalyticsTarget> = load_projects(&pool)
        .await?
        .into_iter()
        .filter(|p| is_linked(p.video_id.as_deref()))
        .filter_map(|p| {
            Some(AnalyticsTarget {
                video_id: p.video_id?,
                label: p.name,
                project_id: Some(p.id),
            })
        })
        .collect();

    match client.uploads_playlist_id().await {
        Ok(Some(playlist)) => {
            for video in client.recent_videos(&playlist, ANALYTICS_RECENT_UPLOADS).await? {
                if !targets.iter().any(|t| t.video_id == video.id) {
                    targets.push(AnalyticsTarget {
                        label: video.short_title(),
                        video_id: video.id,
                        project_id: None,
                    });
                }
            }
        }
        Ok(None) => warn!("No uploads playlist; only linked kits are checked"),
        Err(e) => warn!("Could not list recent uploads: {}", e),
    }

    let (start, end) = analytics_window(today);
    println!(">> Fetching analytics {} to {} for {} videos", start, end, targets.len());

    let mut summary = AnalyticsSummary::default();
    for target in &targets {
        let analytics = match client.video_analytics(&target.video_id, &start, &end).await {
            Ok(Some(analytics)) => analytics,
            Ok(None) => continue,
            Err(e) => {
                warn!(video = %target.video_id, "Analytics request failed: {}", e);
                summary.errors += 1;
                continue;
            }
        };
        summary.fetched += 1;

        let tag = if target.project_id.is_some() { "[OK]" } else { "[EXT]" };
        println!(
            "  {} {:<30} {:>8} views  {:>5.1}% viewed  {:.2} watch hrs",
            tag,
            target.label.chars().take(30).collect::<String>(),
            format_thousands(analytics.views as f64),
            analytics.avg_view_percentage,
            analytics.watch_minutes / 60.0
        );

        if let Some(project_id) = &target.project_id {
            let metric = VideoMetric {
                project_id: project_id.clone(),
                snapshot_date: end.clone(),
                views: Some(analytics.views),
                likes: Some(analytics.likes),
                comments: Some(analytics.comments),
                impressions: None,
                ctr: None,
                avg_view_duration: Some(analytics.avg_view_duration),
                avg_percentage_viewed: Some(analytics.avg_view_percentage),
                watch_time_hours: Some(analytics.watch_minutes / 60.0),
                subscribers_gained: Some(analytics.subscribers_gained),
            };
            insert_metric(&pool, &metric).await?;
            summary.stored += 1;
        }
    }
    pool.close().await;
    Ok(summary)
}

pub async fn run(root: &Path, args: SyncArgs) -> Result<()> {
    match args.action {
        Some(SyncAction::Analytics) => {
            let ctx = super::active_context(root)?;
            let client = YouTubeClient::for_channel(&ctx)?;
            let summary = fetch_analytics(&ctx, &client, time::today()).await?;
            println!(
                "\n>> Fetched {} videos, stored {} snapshots ({} errors)",
                summary.fetched, summary.stored, summary.errors
            );
        }
        Some(SyncAction::ImportStudio { csv }) => {
            let ctx = super::active_context(root)?;
            let summary = import_studio(&ctx, &csv).await?;
            println!(
                ">> Imported {} rows ({} skipped: not linked to a kit)",
                summary.imported, summary.skipped
            );
        }
        None => {
            let count = fetch_count(args.deep, args.count);
            if args.all_channels {
                let manager = ContextManager::new(root)?;
                for channel in manager.list_channels()? {
                    let Some(ctx) = manager.context(&channel.name)? else {
                        continue;
                    };
                    let result = match YouTubeClient::for_channel(&ctx) {
                        Ok(client) => sync_channel(&ctx, &client, count).await,
                        Err(e) => Err(e.into()),
                    };
                    if let Err(e) = result {
                        println!("[!] {}: {:#}", channel.name, e);
                    }
                }
            } else {
                let ctx = super::active_context(root)?;
                let client = YouTubeClient::for_channel(&ctx)?;
                sync_channel(&ctx, &client, count).await?;
            }
        }
    }
    Ok(())
}
