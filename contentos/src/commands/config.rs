//! `contentos config` - show settings and toggle feature flags

use anyhow::Result;
use clap::Subcommand;
use contentos_common::config::GlobalConfig;
use contentos_common::ContextManager;
use std::path::Path;
use tracing::info;

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Enable a feature
    Enable {
        /// Feature name (e.g. llm_swarm)
        feature: String,
    },
    /// Disable a feature
    Disable {
        /// Feature name
        feature: String,
    },
}

pub async fn run(root: &Path, command: ConfigCommand) -> Result<()> {
    let mut manager = ContextManager::new(root)?;
    match command {
        ConfigCommand::Show => {
            show(root, manager.global_config());
            Ok(())
        }
        ConfigCommand::Enable { feature } => set_feature(&mut manager, &feature, true),
        ConfigCommand::Disable { feature } => set_feature(&mut manager, &feature, false),
    }
}

fn show(root: &Path, config: &GlobalConfig) {
    println!("ContentOS configuration ({})\n", GlobalConfig::path(root).display());
    println!("Version:        {}", config.version);
    println!(
        "Active channel: {}",
        config.active_channel.as_deref().unwrap_or("(none)")
    );
    println!("Default theme:  {}", config.default_theme);
    println!("Auto-sync:      {}", config.auto_sync_on_publish);
    println!("\nFeatures:");
    for (name, enabled) in config.features.entries() {
        println!("  [{}] {}", if enabled { "ON " } else { "OFF" }, name);
    }
}

/// Flip one feature flag and persist the config
pub fn set_feature(manager: &mut ContextManager, feature: &str, enabled: bool) -> Result<()> {
    manager.update_global_config(|config| config.features.set(feature, enabled))?;
    info!(feature = %feature, enabled, "Feature flag updated");
    println!(
        "[OK] {} {}",
        feature,
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}
