//! `contentos archive` - move old published kits out of `production/`

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use contentos_common::files::list_subdirs;
use contentos_common::kit::{KitDocument, KitEntry, KitLedger, KitStatus};
use contentos_common::{time, ChannelContext};
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

/// Published kits older than this many days may be archived
pub const ARCHIVE_THRESHOLD_DAYS: i64 = 30;

#[derive(Debug, Subcommand)]
pub enum ArchiveCommand {
    /// List kits eligible for archiving
    List,
    /// Archive old kits
    Run {
        /// Archive all eligible kits
        #[arg(long)]
        all: bool,
        /// Archive one kit by ID
        #[arg(long = "kit")]
        kit_id: Option<String>,
        /// Skip the age check
        #[arg(long)]
        force: bool,
    },
    /// Restore an archived kit
    Restore {
        /// Archived folder name (e.g. 004_ice_cube)
        #[arg(long = "kit")]
        folder: Option<String>,
    },
}

/// Days since the kit was published; `None` when unpublished or undated
pub fn kit_age_days(document: &KitDocument, now: DateTime<Utc>) -> Option<i64> {
    if document.status() != Some(KitStatus::Published) {
        return None;
    }
    let published = time::parse_timestamp(document.published_at.as_deref()?)?;
    Some((now - published).num_days())
}

/// Published kits past the threshold, with their age
pub fn eligible_kits(kits: Vec<KitEntry>, now: DateTime<Utc>) -> Vec<(KitEntry, i64)> {
    kits.into_iter()
        .filter_map(|kit| {
            let age = kit.document.as_ref().and_then(|d| kit_age_days(d, now))?;
            (age > ARCHIVE_THRESHOLD_DAYS).then_some((kit, age))
        })
        .collect()
}

/// Move one kit into `production/archive/` and mark it archived.
/// The kit is left untouched in production when the move fails.
pub fn archive_kit(ctx: &ChannelContext, kit: &KitEntry) -> Result<PathBuf> {
    let mut document = kit
        .document
        .clone()
        .with_context(|| format!("{} has no readable kit.yaml", kit.folder_name()))?;
    document.transition_to(KitStatus::Archived)?;

    let archive_dir = ctx.archive_path();
    std::fs::create_dir_all(&archive_dir)?;
    let dest = archive_dir.join(kit.folder_name());
    if dest.exists() {
        bail!("{} already exists in the archive", kit.folder_name());
    }
    std::fs::rename(&kit.path, &dest)
        .with_context(|| format!("Failed to move {} to the archive", kit.folder_name()))?;

    if let Err(e) = document.save(&dest.join("kit.yaml")) {
        if let Err(undo) = std::fs::rename(&dest, &kit.path) {
            warn!(kit = %kit.folder_name(), error = %undo, "Failed to move kit back to production");
        }
        return Err(e).with_context(|| format!("Failed to mark {} archived", kit.folder_name()));
    }
    info!(kit = %kit.folder_name(), "Archived kit");
    Ok(dest)
}

/// Archived folder names are single path components
fn check_folder_name(folder: &str) -> Result<()> {
    let mut components = Path::new(folder).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !folder.contains(['/', '\\']) => Ok(()),
        _ => bail!("Invalid kit folder name '{}'", folder),
    }
}

/// Move an archived folder back into production and mark it published
pub fn restore_kit(ctx: &ChannelContext, folder: &str) -> Result<PathBuf> {
    check_folder_name(folder)?;
    let source = ctx.archive_path().join(folder);
    if !source.is_dir() {
        bail!("Kit '{}' not found in archive.", folder);
    }
    let dest = ctx.production_path().join(folder);
    if dest.exists() {
        bail!("{} already exists in production", folder);
    }
    std::fs::rename(&source, &dest)
        .with_context(|| format!("Failed to restore {}", folder))?;

    let yaml_path = dest.join("kit.yaml");
    match KitDocument::load(&yaml_path)? {
        Some(mut document) => {
            document.transition_to(KitStatus::Published)?;
            document.save(&yaml_path)?;
        }
        None => warn!("{} has no kit.yaml", folder),
    }
    info!(kit = %folder, "Restored kit");
    Ok(dest)
}

pub async fn run(root: &Path, command: ArchiveCommand) -> Result<()> {
    let ctx = super::active_context(root)?;
    let ledger = KitLedger::new(ctx.production_path());
    let now = time::now();

    match command {
        ArchiveCommand::List => {
            let kits = ledger.list()?;
            let total = kits.len();
            let eligible = eligible_kits(kits, now);
            if eligible.is_empty() {
                println!("No kits older than {} days.", ARCHIVE_THRESHOLD_DAYS);
                println!("All {} kits are still in Active context.", total);
                return Ok(());
            }
            println!(
                "\nKits eligible for archiving (>{} days old):\n",
                ARCHIVE_THRESHOLD_DAYS
            );
            println!("{:<5} {:<30} {:<10}", "ID", "Name", "Age (Days)");
            println!("{}", "-".repeat(50));
            for (kit, age) in &eligible {
                println!("{:<5} {:<30} {:<10}", kit.id, kit.slug, age);
            }
            println!("\nTotal: {} kits", eligible.len());
            println!("\nRun: contentos archive run --all  (to archive all)");
            println!("Run: contentos archive run --kit <ID>  (to archive one)");
        }
        ArchiveCommand::Run { all, kit_id, force } => {
            let kits = match kit_id.as_deref() {
                Some(id) => match ledger.find(id)? {
                    Some(kit) => vec![kit],
                    None => bail!("Kit {} not found", id),
                },
                None if all => ledger.list()?,
                None => bail!("Specify --all or --kit <ID>"),
            };

            let mut archived = 0;
            for kit in kits {
                let Some(document) = kit.document.as_ref() else {
                    continue;
                };
                if document.status() != Some(KitStatus::Published) {
                    continue;
                }
                let age = kit_age_days(document, now).unwrap_or(0);
                if age <= ARCHIVE_THRESHOLD_DAYS && !force {
                    continue;
                }
                match archive_kit(&ctx, &kit) {
                    Ok(_) => {
                        println!("Archived: {} ({} days old)", kit.slug, age);
                        archived += 1;
                    }
                    Err(e) => println!("[!] {}: {:#}", kit.folder_name(), e),
                }
            }

            if archived == 0 {
                println!("No kits archived. Use --force to override age check.");
            } else {
                println!("\nArchived {} kits to production/archive", archived);
            }
        }
        ArchiveCommand::Restore { folder } => match folder {
            Some(folder) => {
                restore_kit(&ctx, &folder)?;
                println!("Restored: {} to active production.", folder);
            }
            None => {
                let archived = list_subdirs(&ctx.archive_path())?;
                if archived.is_empty() {
                    println!("No archived kits.");
                    return Ok(());
                }
                println!("\nArchived Kits:\n");
                for name in archived {
                    println!("  - {}", name);
                }
                println!("\nRun: contentos archive restore --kit <FOLDER_NAME>");
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use contentos_common::kit::KitBlueprint;
    use contentos_common::ContextManager;
    use tempfile::TempDir;

    fn published_kit(ctx: &ChannelContext, id: &str, name: &str, published_at: &str) {
        let path = ctx.production_path().join(format!("{}_{}", id, name));
        let mut doc = KitBlueprint {
            id: id.to_string(),
            name: name.to_string(),
            theme: "loop".to_string(),
            formula: "stitch_2clip".to_string(),
            strategy: None,
            created: "2025-01-01".to_string(),
        }
        .write(&path)
        .unwrap();
        doc.transition_to(KitStatus::Published).unwrap();
        doc.published_at = Some(published_at.to_string());
        doc.save(&path.join("kit.yaml")).unwrap();
    }

    #[test]
    fn test_archive_and_restore_round_trip() {
        let temp = TempDir::new().unwrap();
        let manager = ContextManager::new(temp.path()).unwrap();
        let ctx = manager.create_channel("cats", None).unwrap();
        published_kit(&ctx, "001", "old_clock", "2025-01-01T12:00:00Z");
        published_kit(&ctx, "002", "new_cube", "2025-03-01T12:00:00Z");

        let now = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
        let ledger = KitLedger::new(ctx.production_path());
        let eligible = eligible_kits(ledger.list().unwrap(), now);
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].0.id, "001");
        assert_eq!(eligible[0].1, 67);

        let dest = archive_kit(&ctx, &eligible[0].0).unwrap();
        assert!(dest.ends_with("archive/001_old_clock"));
        assert!(!ctx.production_path().join("001_old_clock").exists());
        let archived = KitDocument::load(&dest.join("kit.yaml")).unwrap().unwrap();
        assert_eq!(archived.status(), Some(KitStatus::Archived));
        assert_eq!(ledger.list().unwrap().len(), 1);

        restore_kit(&ctx, "001_old_clock").unwrap();
        let restored = ledger.find("1").unwrap().unwrap();
        assert_eq!(restored.stored_status(), Some("published"));
        assert!(restore_kit(&ctx, "001_old_clock").is_err());
    }

    #[test]
    fn test_unpublished_kit_has_no_age() {
        let doc = KitDocument::new_draft("001", "x", "2025-01-01", "loop", "stitch_2clip");
        assert_eq!(kit_age_days(&doc, time::now()), None);
    }

    fn cats_channel(temp: &TempDir) -> ChannelContext {
        let manager = ContextManager::new(temp.path()).unwrap();
        manager.create_channel("cats", None).unwrap()
    }

    #[test]
    fn test_blocked_archive_leaves_kit_in_production() {
        let temp = TempDir::new().unwrap();
        let ctx = cats_channel(&temp);
        published_kit(&ctx, "001", "clock", "2025-01-01T12:00:00Z");
        std::fs::create_dir_all(ctx.archive_path().join("001_clock")).unwrap();

        let ledger = KitLedger::new(ctx.production_path());
        let kit = ledger.find("001").unwrap().unwrap();
        let err = archive_kit(&ctx, &kit).unwrap_err();
        assert!(err.to_string().contains("already exists in the archive"));

        let kit = ledger.find("001").unwrap().unwrap();
        assert!(kit.path.is_dir());
        assert_eq!(kit.stored_status(), Some("published"));
        let document = kit.document.unwrap();
        assert_eq!(document.status(), Some(KitStatus::Published));
    }

    #[test]
    fn test_restore_rejects_paths_outside_archive() {
        let temp = TempDir::new().unwrap();
        let ctx = cats_channel(&temp);
        std::fs::create_dir_all(ctx.path.join("escaped")).unwrap();

        for folder in ["../escaped", "../../cats/escaped", "a/b", "..", ""] {
            let err = restore_kit(&ctx, folder).unwrap_err();
            assert!(err.to_string().contains("Invalid kit folder name"), "{}", folder);
        }
        let absolute = ctx.path.join("escaped");
        assert!(restore_kit(&ctx, &absolute.to_string_lossy()).is_err());
        assert!(ctx.path.join("escaped").is_dir());
    }
}
