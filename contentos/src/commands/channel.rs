//! `contentos channel` - list, switch, create and inspect channels

use anyhow::Result;
use clap::Subcommand;
use contentos_common::growth::next_slot;
use contentos_common::kit::{DisplayStatus, KitLedger};
use contentos_common::{time, ContextManager};
use std::path::Path;

#[derive(Debug, Subcommand)]
pub enum ChannelCommand {
    /// List all channels
    List,
    /// Switch the active channel
    Use {
        /// Channel folder name
        name: String,
    },
    /// Create a new channel
    Create {
        /// Channel name
        name: String,
        /// YouTube handle
        #[arg(long)]
        handle: Option<String>,
    },
    /// Show active channel status
    Status,
}

pub async fn run(root: &Path, command: ChannelCommand) -> Result<()> {
    let mut manager = ContextManager::new(root)?;
    match command {
        ChannelCommand::List => list(&manager),
        ChannelCommand::Use { name } => {
            let ctx = manager.use_channel(&name)?;
            println!("[OK] Active channel: {} ({})", ctx.display_name(), ctx.name);
            Ok(())
        }
        ChannelCommand::Create { name, handle } => {
            let ctx = manager.create_channel(&name, handle.as_deref())?;
            println!("[OK] Created channel: {}", ctx.name);
            println!("   path: {}", ctx.path.display());
            println!("   |-- analytics/");
            println!("   |-- production/");
            println!("   |-- strategy/");
            println!("\nNext: contentos channel use {}", ctx.name);
            Ok(())
        }
        ChannelCommand::Status => status(&manager),
    }
}

fn list(manager: &ContextManager) -> Result<()> {
    let channels = manager.list_channels()?;
    if channels.is_empty() {
        println!("No channels yet. Create one: contentos channel create <name>");
        return Ok(());
    }
    println!("Channels:\n");
    for channel in channels {
        let marker = if channel.is_active { "*" } else { " " };
        let handle = if channel.handle.is_empty() {
            String::new()
        } else {
            format!(" ({})", channel.handle)
        };
        println!(" {} {:<20} {}{}", marker, channel.name, channel.display_name, handle);
    }
    Ok(())
}

fn status(manager: &ContextManager) -> Result<()> {
    let ctx = manager.current_context()?;
    let kits = KitLedger::new(ctx.production_path()).list()?;
    let pending = kits
        .iter()
        .filter(|k| k.display_status == DisplayStatus::Pending)
        .count();
    let handle = if ctx.config.handle.is_empty() {
        "Not set"
    } else {
        ctx.config.handle.as_str()
    };

    println!("\nACTIVE CHANNEL STATUS");
    println!("{}", "=".repeat(40));
    println!("Name:    {}", ctx.display_name());
    println!("Handle:  {}", handle);
    println!("Path:    {}", ctx.path.display());
    println!("Themes:  {}", ctx.config.themes.join(", "));
    println!("Kits:    {} total ({} pending upload)", kits.len(), pending);
    println!("{}", "-".repeat(40));
    println!("Next Slot: {}", next_slot(time::now(), 0.0));
    println!("{}", "=".repeat(40));
    Ok(())
}
