//! Production kits
//!
//! A kit is a folder `production/NNN_<slug>/` holding `script.txt`,
//! `prompt.txt`, `kit.yaml` and the asset directories of its formula.

pub mod ledger;
pub mod model;
pub mod schema;
pub mod templates;

pub use ledger::{DisplayStatus, KitEntry, KitLedger};
pub use model::{Ingredients, KitDocument, KitStatus, Performance, Ratings};
pub use schema::{validate_kit, validate_kit_file};
pub use templates::{Formula, KitBlueprint};

/// Placeholder video id written by older tooling for unlinked kits
pub const UNLINKED_VIDEO_ID: &str = "TBD";

/// Lowercase, spaces to underscores
pub fn slugify(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Capitalize the first letter of every word and lowercase the rest
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// Three-digit zero-padded kit id
pub fn format_kit_id(id: u32) -> String {
    format!("{:03}", id)
}

/// `NNN_<slug>` folder name for a new kit
pub fn kit_folder_name(id: u32, name: &str) -> String {
    format!("{}_{}", format_kit_id(id), slugify(name))
}

/// True when `video_id` names a real upload
pub fn is_linked(video_id: Option<&str>) -> bool {
    matches!(video_id, Some(id) if !id.is_empty() && id != UNLINKED_VIDEO_ID)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Melting Clock"), "melting_clock");
        assert_eq!(slugify("  Glass Cube "), "glass_cube");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("melting clock"), "Melting Clock");
        assert_eq!(title_case("rOT nAtion"), "Rot Nation");
        assert_eq!(title_case("neon-cube 2x"), "Neon-Cube 2X");
    }

    #[test]
    fn test_kit_folder_name() {
        assert_eq!(kit_folder_name(7, "Melting Clock"), "007_melting_clock");
        assert_eq!(kit_folder_name(123, "x"), "123_x");
    }

    #[test]
    fn test_is_linked() {
        assert!(is_linked(Some("dQw4w9WgXcQ")));
        assert!(!is_linked(Some("TBD")));
        assert!(!is_linked(Some("")));
        assert!(!is_linked(None));
    }
}
