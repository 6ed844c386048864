//! `contentos kit` - create, publish, link and enrich production kits

use crate::services::{Enricher, ExtractionSource, OllamaClient, VideoStats, YouTubeClient};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use contentos_common::analysis::{best_value, predict_scores, IngredientKind};
use contentos_common::brain::Brain;
use contentos_common::config::GlobalConfig;
use contentos_common::db::load_projects;
use contentos_common::growth::{check_safety, next_slot, upload_pressure, SafetyReport};
use contentos_common::kit::templates::DEFAULT_FORMULA;
use contentos_common::kit::{
    format_kit_id, is_linked, kit_folder_name, slugify, validate_kit_file, KitBlueprint,
    KitDocument, KitEntry, KitLedger, KitStatus,
};
use contentos_common::{time, ChannelContext, ContextManager};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Every kit whose id is a multiple of this gets the experimental directive
pub const WILDCARD_INTERVAL: u32 = 5;

pub const WILDCARD_STRATEGY: &str = "## EXPERIMENTAL WILDCARD
DO NOT reuse past successful hooks or physics.
You must TRY SOMETHING NEW to discover new viral ingredients.
1. Use a completely new Hook type (e.g. 'Confrontational', 'Silent').
2. Invert the usual Physics (e.g. if we usually Melt, trying Shattering).
3. Change the Audio Landscape (e.g. Silence instead of Bass).

";

/// Recent uploads read for the publish guardrails
const GUARDRAIL_UPLOADS: usize = 10;
/// Uploads listed by `kit link` without `--kit`
const LINK_LIST_UPLOADS: usize = 50;

#[derive(Debug, Subcommand)]
pub enum KitCommand {
    /// Create a new production kit
    Create {
        /// Kit name (e.g. "melting clock")
        name: String,
        /// Theme; defaults to the brain's active theme
        #[arg(long)]
        theme: Option<String>,
        /// Video formula
        #[arg(long, default_value = DEFAULT_FORMULA)]
        formula: String,
    },
    /// List all kits
    List,
    /// Mark a kit as published
    Publish {
        /// Kit ID
        kit_id: String,
        /// Publish even when the guardrails say no
        #[arg(long)]
        force: bool,
    },
    /// Link a kit to an upload
    Link {
        /// Video ID; defaults to the latest upload
        #[arg(long)]
        video: Option<String>,
        /// Kit ID
        #[arg(long = "kit")]
        kit_id: Option<String>,
        /// Store as the kit's short-form upload
        #[arg(long)]
        short: bool,
    },
    /// Extract ingredients from prompt.txt
    Enrich {
        /// Only this kit
        #[arg(long = "kit")]
        kit_id: Option<String>,
        /// Re-extract kits that already have ingredients
        #[arg(long)]
        force: bool,
    },
    /// Suggest ingredients from past performance
    Suggest {
        /// Score every ingredient against the channel baseline
        #[arg(long)]
        predict: bool,
    },
    /// Validate every kit.yaml
    Validate,
}

pub fn is_wildcard(id: u32) -> bool {
    id > 0 && id % WILDCARD_INTERVAL == 0
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedKit {
    pub id: String,
    pub path: PathBuf,
    pub theme: String,
    pub wildcard: bool,
    /// Strategic direction injected at the top of `prompt.txt`
    pub strategy: String,
}

fn resolve_theme(brain: &Brain, global: &GlobalConfig, requested: Option<&str>) -> Result<String> {
    if let Some(theme) = requested.filter(|t| !t.trim().is_empty()) {
        return Ok(theme.to_string());
    }
    if brain.exists() {
        let state = brain.load_state()?;
        if !state.active_theme.is_empty() {
            return Ok(state.active_theme);
        }
    }
    Ok(global.default_theme.clone())
}

fn brain_strategy(brain: &Brain, theme: &str) -> Result<String> {
    if !brain.exists() {
        brain.init()?;
    }
    let mut strategy = brain.prompt_context(Some(theme))?;
    if let Some(protocols) = brain.load_protocols()?.filter(|p| !p.trim().is_empty()) {
        strategy.push_str("\n\n## CHANNEL PROTOCOLS\n");
        strategy.push_str(&protocols);
        strategy.push('\n');
    }
    Ok(strategy)
}

/// Lay out the next kit folder for `name`
pub fn create_kit(
    ctx: &ChannelContext,
    global: &GlobalConfig,
    name: &str,
    theme: Option<&str>,
    formula: &str,
) -> Result<CreatedKit> {
    let slug = slugify(name);
    if slug.is_empty() {
        bail!("Kit name cannot be empty");
    }

    let brain = Brain::for_channel(ctx);
    let theme = resolve_theme(&brain, global, theme)?;
    let ledger = KitLedger::new(ctx.production_path());
    let id = ledger.next_id()?;
    let path = ctx.production_path().join(kit_folder_name(id, &slug));
    if path.exists() {
        bail!("{} already exists", path.display());
    }

    let wildcard = is_wildcard(id);
    let strategy = if wildcard {
        WILDCARD_STRATEGY.to_string()
    } else {
        brain_strategy(&brain, &theme)?
    };

    let blueprint = KitBlueprint {
        id: format_kit_id(id),
        name: slug,
        theme: theme.clone(),
        formula: formula.to_string(),
        strategy: Some(strategy.clone()),
        created: time::today().format("%Y-%m-%d").to_string(),
    };
    blueprint
        .write(&path)
        .with_context(|| format!("Failed to write kit {}", path.display()))?;
    info!(kit = %path.display(), wildcard, "Created kit");

    Ok(CreatedKit {
        id: blueprint.id,
        path,
        theme,
        wildcard,
        strategy,
    })
}

fn find_kit(ctx: &ChannelContext, kit_id: &str) -> Result<KitEntry> {
    KitLedger::new(ctx.production_path())
        .find(kit_id)?
        .with_context(|| format!("Kit {} not found", kit_id))
}

fn kit_document(kit: &KitEntry) -> Result<KitDocument> {
    kit.document
        .clone()
        .with_context(|| format!("{} has no readable kit.yaml", kit.folder_name()))
}

/// Set `published` and `published_at`; archived kits are refused
pub fn mark_published(kit: &KitEntry, now: DateTime<Utc>) -> Result<KitDocument> {
    let mut document = kit_document(kit)?;
    if document.status() == Some(KitStatus::Archived) {
        bail!("Kit {} is archived. Restore it first.", kit.id);
    }
    document.transition_to(KitStatus::Published)?;
    document.published_at = Some(now.to_rfc3339());
    document.save(&kit.yaml_path())?;
    Ok(document)
}

/// Store `video_id` (or `video_id_short`) and mark the kit published
pub fn link_kit(kit: &KitEntry, video_id: &str, short: bool) -> Result<KitDocument> {
    let mut document = kit_document(kit)?;
    if short {
        document.video_id_short = Some(video_id.to_string());
    } else {
        document.video_id = Some(video_id.to_string());
    }
    document.transition_to(KitStatus::Published)?;
    document.save(&kit.yaml_path())?;
    Ok(document)
}

/// Guardrail verdict for recent uploads, plus today's upload count
pub fn guardrails(videos: &[VideoStats], now: DateTime<Utc>) -> (SafetyReport, usize) {
    let (last, daily) = upload_pressure(videos.iter().map(|v| v.published_at.as_str()), now);
    (check_safety(last, daily, now), daily)
}

async fn recent_uploads(client: &YouTubeClient, count: usize) -> Result<Vec<VideoStats>> {
    match client.uploads_playlist_id().await? {
        Some(playlist) => Ok(client.recent_videos(&playlist, count).await?),
        None => Ok(Vec::new()),
    }
}

async fn check_guardrails(ctx: &ChannelContext, now: DateTime<Utc>) -> Result<SafetyReport> {
    let client = YouTubeClient::for_channel(ctx)?;
    let videos = recent_uploads(&client, GUARDRAIL_UPLOADS).await?;
    Ok(guardrails(&videos, now).0)
}

async fn publish(ctx: &ChannelContext, kit_id: &str, force: bool) -> Result<()> {
    let kit = find_kit(ctx, kit_id)?;
    let now = time::now();

    println!(">> Checking growth guardrails...");
    match check_guardrails(ctx, now).await {
        Ok(report) if !report.safe => {
            for warning in &report.warnings {
                println!("   [!] {}", warning);
            }
            if !force {
                bail!("Publishing blocked by growth guardrails. Use --force to override.");
            }
            println!("   [!] Overridden with --force");
        }
        Ok(_) => println!("   [OK] Safe to publish"),
        Err(e) => {
            warn!("Guardrail check skipped: {:#}", e);
            println!("   [!] Could not reach YouTube, guardrail check skipped");
        }
    }

    mark_published(&kit, now)?;
    println!(">> Published: {}", kit.folder_name());
    super::sync_database(ctx).await?;
    Ok(())
}

async fn link(
    ctx: &ChannelContext,
    video: Option<String>,
    kit_id: Option<String>,
    short: bool,
) -> Result<()> {
    let Some(kit_id) = kit_id else {
        return show_link_state(ctx).await;
    };
    let kit = find_kit(ctx, &kit_id)?;

    let video_id = match video {
        Some(video) => video,
        None => {
            let client = YouTubeClient::for_channel(ctx)?;
            let latest = recent_uploads(&client, 1)
                .await?
                .into_iter()
                .next()
                .context("No uploads found on the channel")?;
            println!(">> Latest upload: {} ({})", latest.title, latest.id);
            latest.id
        }
    };

    link_kit(&kit, &video_id, short)?;
    let field = if short { "video_id_short" } else { "video_id" };
    println!(">> Linked {} -> {} ({})", kit.folder_name(), video_id, field);
    Ok(())
}

async fn show_link_state(ctx: &ChannelContext) -> Result<()> {
    let client = YouTubeClient::for_channel(ctx)?;
    let videos = recent_uploads(&client, LINK_LIST_UPLOADS).await?;
    let now = time::now();

    println!("RECENT UPLOADS\n");
    println!("{:<13} {:<12} {:>9}  Title", "Video ID", "Published", "Views");
    println!("{}", "-".repeat(70));
    for video in &videos {
        println!(
            "{:<13} {:<12} {:>9}  {}",
            video.id,
            video.published_date(),
            video.views,
            video.short_title()
        );
    }

    println!("\nKITS\n");
    for kit in KitLedger::new(ctx.production_path()).list()? {
        let main = kit.video_id().filter(|id| is_linked(Some(*id))).unwrap_or("-");
        let short = kit
            .document
            .as_ref()
            .and_then(|d| d.video_id_short.as_deref())
            .unwrap_or("-");
        println!("{:<5} {:<30} V:{:<13} S:{}", kit.id, kit.slug, main, short);
    }

    let (report, daily) = guardrails(&videos, now);
    println!("\nGROWTH GUARDRAILS");
    println!("  Uploads today: {}", daily);
    println!("  Next slot: {}", next_slot(now, 0.0));
    for warning in &report.warnings {
        println!("  [!] {}", warning);
    }
    println!("\nRun: contentos kit link --kit <ID> [--video <VIDEO_ID>] [--short]");
    Ok(())
}

/// Extract and store ingredients for each kit; returns how many were enriched
pub async fn enrich_kits(enricher: &Enricher, kits: &[KitEntry], force: bool) -> Result<usize> {
    let mut enriched = 0;
    for kit in kits {
        let (Some(document), true) = (kit.document.as_ref(), kit.prompt_path().is_file()) else {
            println!("   [SKIP] {}: missing kit.yaml or prompt.txt", kit.folder_name());
            continue;
        };
        if document.is_enriched() && !force {
            println!("   [SKIP] {}: already enriched", kit.folder_name());
            continue;
        }

        let prompt = std::fs::read_to_string(kit.prompt_path())
            .with_context(|| format!("Failed to read {}", kit.prompt_path().display()))?;
        let (extracted, source) = enricher.extract(&prompt).await;

        let mut document = document.clone();
        extracted.apply(document.ingredients_mut());
        document.save(&kit.yaml_path())?;
        enriched += 1;

        let via = match source {
            ExtractionSource::Llm => "LLM",
            ExtractionSource::Patterns => "patterns",
        };
        println!(
            "   [OK] {}: {} / {} / {} ({})",
            kit.folder_name(),
            extracted.hook_type,
            extracted.audio_style,
            extracted.visual_style,
            via
        );
    }
    Ok(enriched)
}

async fn enrich(
    ctx: &ChannelContext,
    global: &GlobalConfig,
    kit_id: Option<&str>,
    force: bool,
) -> Result<()> {
    let llm = OllamaClient::from_env()?;
    let enricher = if llm.ensure_running(global.features.ollama_autostart).await {
        println!(">> Using Ollama at {}", llm.host());
        Enricher::new(Some(llm))
    } else {
        println!("[!] Ollama not available, using pattern extraction");
        Enricher::offline()
    };

    let kits = match kit_id {
        Some(id) => vec![find_kit(ctx, id)?],
        None => KitLedger::new(ctx.production_path()).list()?,
    };
    println!(">> Enriching {} kits...", kits.len());
    let enriched = enrich_kits(&enricher, &kits, force).await?;
    println!(">> Enriched {} kits.", enriched);

    if enriched > 0 {
        super::sync_database(ctx).await?;
    }
    Ok(())
}

async fn suggest(ctx: &ChannelContext, predict: bool) -> Result<()> {
    let pool = super::open_database(ctx).await?;
    let records = load_projects(&pool).await?;
    pool.close().await;

    if predict {
        let scores = predict_scores(&records);
        println!(">> PREDICTIVE INGREDIENT SCORES\n");
        println!("Channel baseline: {:.0} avg views\n", scores.baseline);
        println!("{:<35} {:<10} {:<12} {:<8}", "Ingredient", "Score", "Avg Views", "Videos");
        println!("{}", "-".repeat(65));
        for score in scores.top() {
            let label: String = format!("{}: {}", score.kind.column(), score.value)
                .chars()
                .take(35)
                .collect();
            println!(
                "{:<35} {:<10} {:<12.0} {:<8}",
                label,
                score.score_label(),
                score.avg_views,
                score.count
            );
        }
        println!("\n100% = channel average, * = outlier (treat with caution)");
        match scores.recommended() {
            Some(best) => println!(
                "\n[RECOMMENDED] {}: {} ({})",
                best.kind.column(),
                best.value,
                best.score_label()
            ),
            None => println!("\n[!] No performance data yet. Run 'contentos sync' first."),
        }
        return Ok(());
    }

    let theme = best_value(&records, IngredientKind::Theme);
    let hook = best_value(&records, IngredientKind::HookType);
    if theme.is_none() && hook.is_none() {
        println!("[!] No performance data yet. Run 'contentos sync' first.");
        return Ok(());
    }
    println!(">> SUGGESTIONS\n");
    if let Some((value, views)) = theme {
        println!("   Best theme: {} ({:.0} avg views)", value, views);
    }
    if let Some((value, views)) = hook {
        println!("   Best hook:  {} ({:.0} avg views)", value, views);
    }
    Ok(())
}

/// Returns the number of kits with schema problems
fn validate(ctx: &ChannelContext) -> Result<usize> {
    let kits = KitLedger::new(ctx.production_path()).list()?;
    let mut invalid = 0;
    for kit in &kits {
        let problems = validate_kit_file(&kit.yaml_path());
        if problems.is_empty() {
            println!("[OK] {}", kit.folder_name());
            continue;
        }
        invalid += 1;
        println!("[X] {}", kit.folder_name());
        for problem in problems {
            println!("    - {}", problem);
        }
    }
    println!("\n{} kits checked, {} with problems.", kits.len(), invalid);
    Ok(invalid)
}

fn list(ctx: &ChannelContext) -> Result<()> {
    let kits = KitLedger::new(ctx.production_path()).list()?;
    if kits.is_empty() {
        println!("No kits yet. Run: contentos kit create <name>");
        return Ok(());
    }
    println!("{:<5} {:<30} {:<15}", "ID", "Name", "Status");
    println!("{}", "-".repeat(50));
    for kit in &kits {
        println!("{:<5} {:<30} {:<15}", kit.id, kit.slug, kit.display_status.to_string());
    }
    println!("\nTotal: {} kits", kits.len());
    Ok(())
}

pub async fn run(root: &Path, command: KitCommand) -> Result<()> {
    let manager = ContextManager::new(root)
        .with_context(|| format!("Failed to load configuration under {}", root.display()))?;
    let ctx = manager.current_context()?;

    match command {
        KitCommand::Create { name, theme, formula } => {
            let kit = create_kit(&ctx, manager.global_config(), &name, theme.as_deref(), &formula)?;
            println!(">> Creating kit #{} ({})", kit.id, kit.theme);
            if kit.wildcard {
                println!("   [WILDCARD] Experimental protocol injected");
            } else {
                for line in kit.strategy.lines().filter(|l| {
                    l.contains('❌') || l.contains('✅') || l.contains("CRITICAL")
                }) {
                    println!("   {}", line.trim());
                }
            }
            println!(">> Kit ready: {}", kit.path.display());
        }
        KitCommand::List => list(&ctx)?,
        KitCommand::Publish { kit_id, force } => publish(&ctx, &kit_id, force).await?,
        KitCommand::Link { video, kit_id, short } => link(&ctx, video, kit_id, short).await?,
        KitCommand::Enrich { kit_id, force } => {
            enrich(&ctx, manager.global_config(), kit_id.as_deref(), force).await?
        }
        KitCommand::Suggest { predict } => suggest(&ctx, predict).await?,
        KitCommand::Validate => {
            validate(&ctx)?;
        }
    }
    Ok(())
}
