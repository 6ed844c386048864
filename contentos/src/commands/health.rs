//! `contentos health` - diagnostics for the active channel

use crate::services::youtube_client::find_token;
use anyhow::Result;
use contentos_common::brain::Brain;
use contentos_common::config::ChannelConfig;
use contentos_common::kit::{validate_kit_file, KitLedger};
use contentos_common::ChannelContext;
use std::path::Path;

/// Findings of one check group
#[derive(Debug, Default, Clone, PartialEq)]
pub struct HealthReport {
    pub brain: Vec<String>,
    pub structure: Vec<String>,
    pub kits: Vec<String>,
    pub token_found: bool,
}

impl HealthReport {
    pub fn issue_count(&self) -> usize {
        self.brain.len() + self.structure.len() + self.kits.len() + usize::from(!self.token_found)
    }

    pub fn is_healthy(&self) -> bool {
        self.issue_count() == 0
    }
}

fn check_json(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Err(_) => Some("File not found".to_string()),
        Ok(text) => serde_json::from_str::<serde_json::Value>(&text)
            .err()
            .map(|e| format!("Invalid JSON: {}", e)),
    }
}

fn check_brain(ctx: &ChannelContext) -> Vec<String> {
    let brain = Brain::for_channel(ctx);
    if !brain.exists() {
        return vec!["[X] Brain folder missing (Run 'contentos brain init')".to_string()];
    }

    let mut issues = Vec::new();
    if let Some(problem) = check_json(&brain.state_path()) {
        issues.push(format!("[X] brain/state.json: {}", problem));
    }
    if !brain.themes_path().is_dir() {
        issues.push("[X] brain/themes/ folder missing".to_string());
    } else if brain.list_themes().map_or(true, |t| t.is_empty()) {
        issues.push("[!] No themes found in brain/themes/".to_string());
    }
    if !brain.learnings_path().exists() {
        issues.push("[X] brain/learnings.md missing".to_string());
    }
    issues
}

fn check_structure(ctx: &ChannelContext) -> Vec<String> {
    let mut issues = Vec::new();
    for (label, path) in [
        ("production", ctx.production_path()),
        ("production/archive", ctx.archive_path()),
        ("analytics", ctx.analytics_path()),
    ] {
        if !path.is_dir() {
            issues.push(format!("[!] Missing folder: {}/", label));
        }
    }
    if let Some(problem) = check_json(&ChannelConfig::path(&ctx.path)) {
        issues.push(format!("[X] .channel.json: {}", problem));
    }
    issues
}

fn check_kits(ctx: &ChannelContext) -> Result<Vec<String>> {
    let mut issues = Vec::new();
    for kit in KitLedger::new(ctx.production_path()).list()? {
        for problem in validate_kit_file(&kit.yaml_path()) {
            issues.push(format!("[!] {}: {}", kit.folder_name(), problem));
        }
    }
    Ok(issues)
}

/// Run every check against `ctx`
pub fn diagnose(ctx: &ChannelContext) -> Result<HealthReport> {
    Ok(HealthReport {
        brain: check_brain(ctx),
        structure: check_structure(ctx),
        kits: check_kits(ctx)?,
        token_found: find_token(ctx).is_some(),
    })
}

fn print_group(title: &str, issues: &[String], ok_lines: &[&str]) {
    println!("\n[{}]", title);
    if issues.is_empty() {
        for line in ok_lines {
            println!("[OK] {}", line);
        }
    } else {
        for issue in issues {
            println!("{}", issue);
        }
    }
}

/// Returns the number of issues found
pub async fn run(root: &Path) -> Result<usize> {
    let ctx = super::active_context(root)?;
    let report = diagnose(&ctx)?;

    println!("\nHEALTH CHECK: {}", ctx.name);
    println!("{}", "=".repeat(40));
    print_group("BRAIN SYSTEM", &report.brain, &["Structured Brain", "State JSON", "Knowledge Base"]);
    print_group("FILE SYSTEM", &report.structure, &["Core Folders", "Configuration"]);
    print_group("KITS", &report.kits, &["kit.yaml schema"]);

    println!("\n[ACCESS]");
    if report.token_found {
        println!("[OK] YouTube Token");
    } else {
        println!("[!] YouTube Token .... MISSING (set CONTENTOS_YOUTUBE_TOKEN or add token.json)");
    }

    println!("\n{}", "=".repeat(40));
    let issues = report.issue_count();
    if report.is_healthy() {
        println!("SYSTEM HEALTHY. Ready to create.");
    } else {
        println!("[!] Found {} issues.", issues);
    }
    Ok(issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentos_common::ContextManager;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_fresh_channel_reports_missing_pieces() {
        std::env::remove_var(crate::services::youtube_client::TOKEN_ENV_VAR);
        let temp = TempDir::new().unwrap();
        let manager = ContextManager::new(temp.path()).unwrap();
        let ctx = manager.create_channel("cats", None).unwrap();

        let report = diagnose(&ctx).unwrap();
        assert_eq!(report.brain.len(), 1);
        assert_eq!(report.structure, vec!["[!] Missing folder: production/archive/"]);
        assert!(report.kits.is_empty());
        assert!(!report.token_found);
        assert_eq!(report.issue_count(), 3);
    }

    #[test]
    #[serial]
    fn test_initialized_channel_is_healthy() {
        std::env::remove_var(crate::services::youtube_client::TOKEN_ENV_VAR);
        let temp = TempDir::new().unwrap();
        let manager = ContextManager::new(temp.path()).unwrap();
        let ctx = manager.create_channel("cats", None).unwrap();
        Brain::for_channel(&ctx).init().unwrap();
        std::fs::create_dir_all(ctx.archive_path()).unwrap();
        std::fs::write(ctx.channel_token_path(), r#"{"access_token": "abc"}"#).unwrap();

        let report = diagnose(&ctx).unwrap();
        assert!(report.is_healthy(), "{:?}", report);
    }

    #[test]
    fn test_bad_state_json_is_reported() {
        let temp = TempDir::new().unwrap();
        let manager = ContextManager::new(temp.path()).unwrap();
        let ctx = manager.create_channel("cats", None).unwrap();
        let brain = Brain::for_channel(&ctx);
        brain.init().unwrap();
        std::fs::write(brain.state_path(), "{ nope").unwrap();

        let issues = check_brain(&ctx);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].starts_with("[X] brain/state.json: Invalid JSON"));
    }
}
