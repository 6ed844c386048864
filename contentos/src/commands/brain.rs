//! `contentos brain` - the channel knowledge folder

use anyhow::{bail, Result};
use clap::Subcommand;
use contentos_common::brain::{Brain, LearningCategory};
use std::path::Path;

/// Evidence recorded for learnings typed in by hand
const MANUAL_EVIDENCE: &str = "Manual entry";

#[derive(Debug, Subcommand)]
pub enum BrainCommand {
    /// Initialize brain for current channel
    Init,
    /// Show brain state
    Show,
    /// Show full prompt context
    Context,
    /// Set active theme
    SetTheme {
        /// Theme name (loop, advice, cinematic)
        theme: String,
    },
    /// Add manual learning
    Learn {
        /// Category: performance, audience, gaps, failures
        category: String,
        /// The insight to add
        insight: String,
    },
}

pub async fn run(root: &Path, command: BrainCommand) -> Result<()> {
    let ctx = super::active_context(root)?;
    let brain = Brain::for_channel(&ctx);

    match command {
        BrainCommand::Init => {
            if brain.exists() {
                println!("Brain already exists for {}.", ctx.name);
                println!("Use 'contentos brain show' to view current state.");
                return Ok(());
            }
            brain.init()?;
            println!("Brain initialized for {}!", ctx.name);
            println!("  Created: brain/state.json");
            println!("  Created: brain/themes/ (loop, advice, cinematic)");
            println!("  Created: brain/learnings.md");
        }
        BrainCommand::Show => {
            require_brain(&brain)?;
            show(&brain, &ctx.name)?;
        }
        BrainCommand::Context => {
            require_brain(&brain)?;
            println!("{}", brain.prompt_context(None)?);
        }
        BrainCommand::SetTheme { theme } => {
            require_brain(&brain)?;
            let theme = theme.to_lowercase();
            brain.set_active_theme(&theme)?;
            println!("Active theme set to: {}", theme);
            println!("Next kit will use this theme's prompt formula.");
        }
        BrainCommand::Learn { category, insight } => {
            let category: LearningCategory = category.parse()?;
            if !brain.exists() {
                brain.init()?;
            }
            brain.add_learning(category, &insight, Some(MANUAL_EVIDENCE))?;
            println!("Learning added to {}:", category);
            println!("  {}", insight);
        }
    }
    Ok(())
}

fn require_brain(brain: &Brain) -> Result<()> {
    if !brain.exists() {
        bail!("Brain not initialized. Run: contentos brain init");
    }
    Ok(())
}

fn show(brain: &Brain, channel: &str) -> Result<()> {
    let state = brain.load_state()?;
    let or_unset = |value: &str, fallback: &'static str| -> String {
        if value.is_empty() {
            fallback.to_string()
        } else {
            value.to_string()
        }
    };
    let first_three = |items: &[String]| {
        if items.is_empty() {
            "No data".to_string()
        } else {
            items.iter().take(3).cloned().collect::<Vec<_>>().join(", ")
        }
    };

    println!("\n{}", "=".repeat(50));
    println!("CHANNEL BRAIN: {}", channel);
    println!("{}", "=".repeat(50));

    println!("\n[Identity]");
    println!("  Name:     {}", or_unset(&state.identity.name, "Not set"));
    println!("  Niche:    {}", or_unset(&state.identity.niche, "Not set"));
    println!("  Audience: {}", or_unset(&state.identity.audience, "Not set"));
    println!("  Tone:     {}", or_unset(&state.identity.tone, "Not set"));

    println!("\n[Performance]");
    println!("  Total Videos: {}", state.performance.total_videos);
    println!("  Avg Views:    {}", state.performance.avg_views);
    println!("  Best Format:  {}", or_unset(&state.performance.best_format, "Unknown"));
    println!("  Best Time:    {}", or_unset(&state.performance.best_post_time, "Unknown"));

    println!("\n[Audience]");
    println!("  Sentiment: {:.2}", state.audience.sentiment);
    println!("  Wants:     {}", first_three(&state.audience.wants));
    println!("  Complaints: {}", first_three(&state.audience.complaints));

    println!("\n[Active Theme]");
    println!("  {}", state.active_theme);

    println!("\n{}", "=".repeat(50));
    println!("Updated: {}", state.updated_at.as_deref().unwrap_or("Never"));
    Ok(())
}
