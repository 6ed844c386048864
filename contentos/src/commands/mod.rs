//! Command handlers
//!
//! Each submodule owns its clap subcommand enum and a `run` entry point.
//! Handlers print reports to stdout; diagnostics go through `tracing`.

pub mod archive;
pub mod brain;
pub mod channel;
pub mod config;
pub mod db;
pub mod health;
pub mod kit;
pub mod setup;
pub mod sync;

use anyhow::{Context, Result};
use contentos_common::db::{init_database, sync_all_projects, SyncSummary};
use contentos_common::{ChannelContext, ContextManager};
use sqlx::SqlitePool;
use std::path::Path;

/// Context of the active channel under `root`
pub fn active_context(root: &Path) -> Result<ChannelContext> {
    let manager = ContextManager::new(root)
        .with_context(|| format!("Failed to load configuration under {}", root.display()))?;
    Ok(manager.current_context()?)
}

/// Open (creating if needed) the channel database
pub async fn open_database(ctx: &ChannelContext) -> Result<SqlitePool> {
    let path = ctx.db_path();
    init_database(&path)
        .await
        .with_context(|| format!("Failed to open database {}", path.display()))
}

/// Mirror every kit folder into the database and print a summary
pub async fn sync_database(ctx: &ChannelContext) -> Result<SyncSummary> {
    let pool = open_database(ctx).await?;
    let summary = sync_all_projects(&pool, &ctx.production_path())
        .await
        .context("Database sync failed")?;
    pool.close().await;

    println!(">> Synced {} projects to database.", summary.synced);
    for folder in &summary.failed {
        println!("   [!] Skipped {}", folder);
    }
    println!(">> Database: {}", ctx.db_path().display());
    Ok(summary)
}
