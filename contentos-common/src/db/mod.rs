//! Per-channel SQLite mirror of the production folders

pub mod init;
pub mod metrics;
pub mod migrations;
pub mod models;
pub mod projects;

pub use init::init_database;
pub use metrics::{insert_metric, latest_metrics};
pub use migrations::run_migrations;
pub use models::{ProjectRecord, VideoMetric};
pub use projects::{load_projects, sync_all_projects, sync_project, video_project_map, SyncSummary};
