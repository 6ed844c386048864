//! `contentos setup` - first-run workspace layout

use crate::services::youtube_client::{shared_token, TOKEN_ENV_VAR};
use anyhow::{Context, Result};
use contentos_common::config::{GlobalConfig, CHANNELS_DIR, CONTENTOS_DIR};
use contentos_common::context::credentials_dir;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Default, PartialEq)]
pub struct SetupReport {
    /// Directories created by this run
    pub created_dirs: Vec<PathBuf>,
    pub created_config: bool,
    pub token_found: bool,
}

/// Create the workspace folders and a default config; existing files are kept
pub fn prepare_workspace(root: &Path) -> Result<SetupReport> {
    let mut report = SetupReport::default();

    for dir in [
        root.join(CHANNELS_DIR),
        root.join(CONTENTOS_DIR),
        credentials_dir(root),
    ] {
        if !dir.is_dir() {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            report.created_dirs.push(dir);
        }
    }

    if !GlobalConfig::path(root).exists() {
        GlobalConfig::default().save(root)?;
        report.created_config = true;
    }

    report.token_found = shared_token(root).is_some();

    info!(root = %root.display(), created = report.created_dirs.len(), "Workspace prepared");
    Ok(report)
}

pub async fn run(root: &Path) -> Result<()> {
    println!("CONTENTOS SETUP\n{}", "=".repeat(50));
    let report = prepare_workspace(root)?;

    println!("\n[STEP 1] Directories");
    for dir in [CHANNELS_DIR, CONTENTOS_DIR, ".contentos/credentials"] {
        let created = report.created_dirs.iter().any(|d| d.ends_with(dir));
        println!("  [OK] {}/ {}", dir, if created { "created" } else { "exists" });
    }

    println!("\n[STEP 2] Configuration");
    println!(
        "  [OK] config.json {}",
        if report.created_config { "created" } else { "exists" }
    );

    println!("\n[STEP 3] YouTube access");
    if report.token_found {
        println!("  [OK] Access token found");
    } else {
        println!("  [!] No access token.");
        println!(
            "      Set {} or save {{\"access_token\": \"...\"}} to {}",
            TOKEN_ENV_VAR,
            credentials_dir(root).join("token.json").display()
        );
    }

    println!("\nQUICK START");
    println!("  contentos channel create mychannel");
    println!("  contentos channel use mychannel");
    println!("  contentos brain init");
    println!("  contentos kit create \"my_video\" --theme loop");
    Ok(())
}
