//! Kit folders → SQLite mirror → graded scoreboard

use chrono::NaiveDate;
use contentos_common::analysis::{aggregate, write_scoreboard, Grade, IngredientKind};
use contentos_common::db::{init_database, load_projects, sync_all_projects};
use contentos_common::kit::{KitBlueprint, KitDocument, KitLedger, KitStatus};
use contentos_common::ContextManager;
use std::fs;
use tempfile::TempDir;

fn blueprint(id: &str, name: &str) -> KitBlueprint {
    KitBlueprint {
        id: id.to_string(),
        name: name.to_string(),
        theme: "loop".to_string(),
        formula: "stitch_2clip".to_string(),
        strategy: Some("Try a macro shot".to_string()),
        created: "2025-01-01".to_string(),
    }
}

#[tokio::test]
async fn test_kits_flow_into_scoreboard() {
    let temp = TempDir::new().unwrap();
    let manager = ContextManager::new(temp.path()).unwrap();
    let ctx = manager.create_channel("cats", None).unwrap();
    let ledger = KitLedger::new(ctx.production_path());

    let performers = [("glass_clock", "Question", 3000), ("ice_cube", "Shock", 100)];
    for (name, hook, views) in performers {
        let id = ledger.next_id_string().unwrap();
        let kit_path = ctx.production_path().join(format!("{}_{}", id, name));
        let mut doc = blueprint(&id, name).write(&kit_path).unwrap();

        doc.ingredients_mut().hook_type = Some(hook.to_string());
        doc.performance_mut().views_7d = Some(views);
        doc.published_at = Some("2024-12-01T10:00:00Z".to_string());
        doc.transition_to(KitStatus::Published).unwrap();
        doc.save(&kit_path.join("kit.yaml")).unwrap();
    }

    let prompt = fs::read_to_string(ctx.production_path().join("001_glass_clock").join("prompt.txt")).unwrap();
    assert!(prompt.starts_with("## [STRATEGIC DIRECTION]\nTry a macro shot\n\n"));

    let pool = init_database(&ctx.db_path()).await.unwrap();
    let summary = sync_all_projects(&pool, &ctx.production_path()).await.unwrap();
    assert_eq!(summary.synced, 2);
    assert!(summary.failed.is_empty());

    let records = load_projects(&pool).await.unwrap();
    assert_eq!(records[0].id, "002");

    let report = aggregate(&records, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
    assert_eq!(report.baseline.total_videos, 2);
    let hooks = report
        .sections
        .iter()
        .find(|s| s.kind == IngredientKind::HookType)
        .unwrap();
    assert_eq!(hooks.rows[0].value, "Question");
    assert_eq!(hooks.rows[0].grade, Grade::A);
    assert_eq!(hooks.rows[1].grade, Grade::F);

    let scoreboard = ctx.scoreboard_path();
    assert!(write_scoreboard(&scoreboard, &report));
    let text = fs::read_to_string(&scoreboard).unwrap();
    assert!(text.contains("| 1 | Question | 1 | 3,000 | - | A |"));
    assert!(text.contains("### Themes"));
}

#[test]
fn test_published_kit_round_trips_unknown_keys() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("kit.yaml");
    fs::write(
        &path,
        "id: 7\nname: clock\nstatus: draft\ncreated: '2025-01-01'\ncustom_note: keep me\n",
    )
    .unwrap();

    let mut doc = KitDocument::load(&path).unwrap().unwrap();
    assert_eq!(doc.id.as_deref(), Some("007"));
    doc.transition_to(KitStatus::Published).unwrap();
    doc.save(&path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("custom_note: keep me"));
    assert!(text.contains("status: published"));
}
