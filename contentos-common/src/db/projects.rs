//! Mirroring kit folders into `projects`, `scripts`, `prompts` and `assets`

use super::models::ProjectRecord;
use crate::files::read_optional;
use crate::kit::templates::{formula, Formula};
use crate::kit::KitDocument;
use crate::{Error, Result};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Outcome of [`sync_all_projects`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub synced: usize,
    pub failed: Vec<String>,
}

/// Write one project row and replace its script, prompt and asset rows
pub async fn sync_project(pool: &SqlitePool, kit_path: &Path) -> Result<ProjectRecord> {
    let folder = kit_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::InvalidInput(format!("Not a kit folder: {}", kit_path.display())))?;
    let (folder_id, folder_slug) = match folder.split_once('_') {
        Some((id, slug)) => (id.to_string(), slug.to_string()),
        None => (folder.clone(), String::new()),
    };

    let doc = KitDocument::load(&kit_path.join("kit.yaml"))?.unwrap_or_default();
    let record = ProjectRecord::from_kit(&folder_id, &folder_slug, &doc);

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT OR REPLACE INTO projects (
            id, name, created_at, status, video_id, published_at,
            hook_type, theme, audio_style, visual_style, physics_type, formula_version,
            views_24h, views_7d, views_30d, likes, retention_avg,
            overall_rating, notes
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.id)
    .bind(&record.name)
    .bind(&record.created_at)
    .bind(&record.status)
    .bind(&record.video_id)
    .bind(&record.published_at)
    .bind(&record.hook_type)
    .bind(&record.theme)
    .bind(&record.audio_style)
    .bind(&record.visual_style)
    .bind(&record.physics_type)
    .bind(&record.formula_version)
    .bind(record.views_24h)
    .bind(record.views_7d)
    .bind(record.views_30d)
    .bind(record.likes)
    .bind(record.retention_avg)
    .bind(&record.overall_rating)
    .bind(&record.notes)
    .execute(&mut *tx)
    .await?;

    if let Some(script) = read_optional(&kit_path.join("script.txt"))? {
        sqlx::query("DELETE FROM scripts WHERE project_id = ?")
            .bind(&folder_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO scripts (project_id, full_text) VALUES (?, ?)")
            .bind(&folder_id)
            .bind(&script)
            .execute(&mut *tx)
            .await?;
    }

    if let Some(prompt) = read_optional(&kit_path.join("prompt.txt"))? {
        sqlx::query("DELETE FROM prompts WHERE project_id = ?")
            .bind(&folder_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO prompts (project_id, prompt_type, content) VALUES (?, 'full', ?)")
            .bind(&folder_id)
            .bind(&prompt)
            .execute(&mut *tx)
            .await?;
    }

    sqlx::query("DELETE FROM assets WHERE project_id = ?")
        .bind(&folder_id)
        .execute(&mut *tx)
        .await?;
    for slot in formula(doc.formula_name()).slots {
        let asset_path = kit_path.join(slot);
        if asset_path.exists() {
            sqlx::query("INSERT INTO assets (project_id, slot, filename) VALUES (?, ?, ?)")
                .bind(&folder_id)
                .bind(Formula::slot_name(slot))
                .bind(asset_path.to_string_lossy().into_owned())
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;
    debug!(project = %record.id, "Synced project");
    Ok(record)
}

/// Sync every production folder whose name starts with a digit.
///
/// A kit that fails to sync is logged and reported; the rest still sync.
pub async fn sync_all_projects(pool: &SqlitePool, production_dir: &Path) -> Result<SyncSummary> {
    let mut summary = SyncSummary::default();
    if !production_dir.is_dir() {
        return Ok(summary);
    }

    let mut folders = Vec::new();
    for entry in std::fs::read_dir(production_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type()?.is_dir() && name.starts_with(|c: char| c.is_ascii_digit()) {
            folders.push((name, entry.path()));
        }
    }
    folders.sort();

    for (name, path) in folders {
        match sync_project(pool, &path).await {
            Ok(_) => summary.synced += 1,
            Err(e) => {
                warn!("Failed to sync {}: {}", name, e);
                summary.failed.push(name);
            }
        }
    }
    Ok(summary)
}

/// All projects, newest id first
pub async fn load_projects(pool: &SqlitePool) -> Result<Vec<ProjectRecord>> {
    Ok(sqlx::query_as::<_, ProjectRecord>("SELECT * FROM projects ORDER BY id DESC")
        .fetch_all(pool)
        .await?)
}

/// `video_id` → project id for linked projects
pub async fn video_project_map(pool: &SqlitePool) -> Result<HashMap<String, String>> {
    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT video_id, id FROM projects WHERE video_id IS NOT NULL AND video_id != 'TBD'")
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().collect())
}
