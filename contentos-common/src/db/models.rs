//! Database models

use crate::kit::KitDocument;
use serde::{Deserialize, Serialize};

/// One row of `projects`, mirrored from a kit folder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
    pub created_at: Option<String>,
    pub status: Option<String>,
    pub video_id: Option<String>,
    pub published_at: Option<String>,
    pub hook_type: Option<String>,
    pub theme: Option<String>,
    pub audio_style: Option<String>,
    pub visual_style: Option<String>,
    pub physics_type: Option<String>,
    pub formula_version: Option<String>,
    pub views_24h: Option<i64>,
    pub views_7d: Option<i64>,
    pub views_30d: Option<i64>,
    pub likes: Option<i64>,
    pub retention_avg: Option<f64>,
    pub overall_rating: Option<String>,
    pub notes: Option<String>,
}

impl ProjectRecord {
    /// Build a row from a kit folder's id/slug and its `kit.yaml`
    pub fn from_kit(folder_id: &str, folder_slug: &str, doc: &KitDocument) -> Self {
        let ingredients = doc.ingredients.clone().unwrap_or_default();
        let performance = doc.performance.clone().unwrap_or_default();
        let ratings = doc.ratings.clone().unwrap_or_default();

        Self {
            id: doc.id.clone().unwrap_or_else(|| folder_id.to_string()),
            name: doc.name.clone().unwrap_or_else(|| folder_slug.to_string()),
            created_at: doc.created.clone(),
            status: Some(doc.status.clone().unwrap_or_else(|| "draft".to_string())),
            video_id: doc.video_id.clone(),
            published_at: doc.published_at.clone(),
            hook_type: ingredients.hook_type,
            theme: ingredients.theme,
            audio_style: ingredients.audio_style,
            visual_style: ingredients.visual_style,
            physics_type: ingredients.physics_type,
            formula_version: ingredients.formula_version,
            views_24h: performance.views_24h,
            views_7d: performance.views_7d,
            views_30d: performance.views_30d,
            likes: performance.likes,
            retention_avg: performance.retention_avg,
            overall_rating: ratings.overall_text(),
            notes: ratings.notes,
        }
    }

    /// `hook + theme` label used in listings
    pub fn combo_label(&self) -> String {
        format!(
            "{} + {}",
            self.hook_type.as_deref().unwrap_or("?"),
            self.theme.as_deref().unwrap_or("?")
        )
    }
}

/// One `video_metrics` snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VideoMetric {
    pub project_id: String,
    pub snapshot_date: String,
    pub views: Option<i64>,
    pub likes: Option<i64>,
    pub comments: Option<i64>,
    pub impressions: Option<i64>,
    pub ctr: Option<f64>,
    /// Seconds
    pub avg_view_duration: Option<f64>,
    pub avg_percentage_viewed: Option<f64>,
    pub watch_time_hours: Option<f64>,
    pub subscribers_gained: Option<i64>,
}
