//! `video_metrics` snapshots

use super::models::VideoMetric;
use crate::Result;
use sqlx::SqlitePool;
use std::collections::HashMap;

/// Append one snapshot
pub async fn insert_metric(pool: &SqlitePool, metric: &VideoMetric) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO video_metrics (
            project_id, snapshot_date, views, likes, comments, impressions, ctr,
            avg_view_duration, avg_percentage_viewed, watch_time_hours, subscribers_gained
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&metric.project_id)
    .bind(&metric.snapshot_date)
    .bind(metric.views)
    .bind(metric.likes)
    .bind(metric.comments)
    .bind(metric.impressions)
    .bind(metric.ctr)
    .bind(metric.avg_view_duration)
    .bind(metric.avg_percentage_viewed)
    .bind(metric.watch_time_hours)
    .bind(metric.subscribers_gained)
    .execute(pool)
    .await?;

    Ok(())
}

/// Latest snapshot per project (by date, then insertion order)
pub async fn latest_metrics(pool: &SqlitePool) -> Result<HashMap<String, VideoMetric>> {
    let rows = sqlx::query_as::<_, VideoMetric>(
        r#"
        SELECT project_id, snapshot_date, views, likes, comments, impressions, ctr,
               avg_view_duration, avg_percentage_viewed, watch_time_hours, subscribers_gained
        FROM video_metrics
        ORDER BY project_id, snapshot_date, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut latest = HashMap::new();
    for row in rows {
        latest.insert(row.project_id.clone(), row);
    }
    Ok(latest)
}
