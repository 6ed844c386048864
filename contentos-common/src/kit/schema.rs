//! `kit.yaml` validation

use super::model::{KitDocument, KitStatus};
use std::path::Path;

pub const REQUIRED_FIELDS: [&str; 4] = ["id", "name", "status", "created"];

pub const VALID_THEMES: [&str; 4] = ["loop", "cinematic", "home_video", "cinematic_realistic"];

pub const VALID_HOOKS: [&str; 5] = ["POV_Emotional", "Question", "Statement", "Curiosity", "Shock"];

pub const VALID_FORMULAS: [&str; 6] = [
    "stitch_2clip",
    "loop_circular",
    "loop_boomerang",
    "cinematic_4shot",
    "fpp_narrative",
    "fpp_short",
];

/// Problems found in a kit document; empty when valid
pub fn validate_kit(doc: &KitDocument) -> Vec<String> {
    let mut errors = Vec::new();

    let present = [
        doc.id.is_some(),
        doc.name.is_some(),
        doc.status.is_some(),
        doc.created.is_some(),
    ];
    for (field, is_present) in REQUIRED_FIELDS.iter().zip(present) {
        if !is_present {
            errors.push(format!("Missing required field: {}", field));
        }
    }

    if let Some(status) = doc.status.as_deref().filter(|s| !s.is_empty()) {
        if status.parse::<KitStatus>().is_err() {
            let valid: Vec<&str> = KitStatus::ALL.iter().map(|s| s.as_str()).collect();
            errors.push(format!("Invalid status '{}'. Valid: {}", status, valid.join(", ")));
        }
    }

    if let Some(ingredients) = &doc.ingredients {
        check_value(&mut errors, "theme", ingredients.theme.as_deref(), &VALID_THEMES);
        check_value(&mut errors, "hook_type", ingredients.hook_type.as_deref(), &VALID_HOOKS);
        check_value(&mut errors, "formula", ingredients.formula.as_deref(), &VALID_FORMULAS);
    }

    errors
}

fn check_value(errors: &mut Vec<String>, field: &str, value: Option<&str>, valid: &[&str]) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        if !valid.contains(&value) {
            errors.push(format!("Invalid {} '{}'. Valid: {}", field, value, valid.join(", ")));
        }
    }
}

/// Validate a `kit.yaml` on disk; read and parse failures are reported as errors
pub fn validate_kit_file(path: &Path) -> Vec<String> {
    match KitDocument::load(path) {
        Ok(Some(doc)) => validate_kit(&doc),
        Ok(None) => vec![format!("Missing {}", path.display())],
        Err(e) => vec![format!("Failed to read {}: {}", path.display(), e)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_valid_draft_has_no_errors() {
        let doc = KitDocument::new_draft("001", "clock", "2026-01-01", "loop", "stitch_2clip");
        assert!(validate_kit(&doc).is_empty());
    }

    #[test]
    fn test_reports_missing_fields_and_bad_values() {
        let doc = KitDocument::from_yaml(
            "name: clock\nstatus: shipped\ningredients:\n  theme: voxel\n  hook_type: Shock\n  formula: triple\n",
        )
        .unwrap();

        let errors = validate_kit(&doc);
        assert!(errors.contains(&"Missing required field: id".to_string()));
        assert!(errors.contains(&"Missing required field: created".to_string()));
        assert!(errors.iter().any(|e| e.starts_with("Invalid status 'shipped'")));
        assert!(errors.iter().any(|e| e.starts_with("Invalid theme 'voxel'")));
        assert!(errors.iter().any(|e| e.starts_with("Invalid formula 'triple'")));
        assert!(!errors.iter().any(|e| e.contains("hook_type")));
    }

    #[test]
    fn test_validate_file_reports_parse_failure() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("kit.yaml");
        std::fs::write(&path, "- just\n- a list\n").unwrap();

        let errors = validate_kit_file(&path);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Failed to read"));
    }
}
