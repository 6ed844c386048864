//! Database initialization
//!
//! Opens (creating if needed) `analytics/contentos.db`, creates the base
//! tables and runs the versioned migrations. Safe to call on every command.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Busy timeout for concurrent CLI invocations on one channel
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        debug!("Opened existing database: {}", db_path.display());
    }

    create_schema_version_table(&pool).await?;
    create_projects_table(&pool).await?;
    create_scripts_table(&pool).await?;
    create_prompts_table(&pool).await?;
    create_assets_table(&pool).await?;

    crate::db::migrations::run_migrations(&pool).await?;

    Ok(pool)
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_projects_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            created_at TEXT,
            status TEXT DEFAULT 'draft',
            video_id TEXT,
            published_at TEXT,
            hook_type TEXT,
            theme TEXT,
            audio_style TEXT,
            visual_style TEXT,
            physics_type TEXT,
            formula_version TEXT,
            views_24h INTEGER,
            views_7d INTEGER,
            views_30d INTEGER,
            likes INTEGER,
            retention_avg REAL,
            overall_rating TEXT,
            notes TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_scripts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scripts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id TEXT,
            hook TEXT,
            visual_sequence TEXT,
            audio_direction TEXT,
            full_text TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_prompts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS prompts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id TEXT,
            prompt_type TEXT,
            content TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_assets_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS assets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id TEXT,
            slot TEXT,
            filename TEXT,
            prompt_used TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_creates_all_tables() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("analytics").join("contentos.db");

        let pool = init_database(&db_path).await.unwrap();
        assert!(db_path.exists());

        for table in ["projects", "scripts", "prompts", "assets", "video_metrics", "schema_version"] {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?)",
            )
            .bind(table)
            .fetch_one(&pool)
            .await
            .unwrap();
            assert!(exists, "missing table {}", table);
        }
    }

    #[tokio::test]
    async fn test_reopen_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("contentos.db");

        let pool = init_database(&db_path).await.unwrap();
        pool.close().await;
        let pool = init_database(&db_path).await.unwrap();

        let versions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_version")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(versions, 2);
    }
}
