//! Enumeration of the kits in a channel's production folder

use super::model::KitDocument;
use super::templates::formula;
use super::{format_kit_id, is_linked};
use crate::files::dir_has_entries;
use crate::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Status derived from folder contents, independent of `kit.yaml` `status`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayStatus {
    Empty,
    Setup,
    Pending,
    Published,
}

impl fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DisplayStatus::Empty => "Empty",
            DisplayStatus::Setup => "Setup",
            DisplayStatus::Pending => "Pending",
            DisplayStatus::Published => "Published",
        })
    }
}

/// One `NNN_<slug>` folder
#[derive(Debug, Clone)]
pub struct KitEntry {
    pub id: String,
    pub slug: String,
    pub path: PathBuf,
    /// `None` when `kit.yaml` is missing or unreadable
    pub document: Option<KitDocument>,
    pub display_status: DisplayStatus,
}

impl KitEntry {
    pub fn folder_name(&self) -> String {
        format!("{}_{}", self.id, self.slug)
    }

    pub fn yaml_path(&self) -> PathBuf {
        self.path.join("kit.yaml")
    }

    pub fn prompt_path(&self) -> PathBuf {
        self.path.join("prompt.txt")
    }

    pub fn stored_status(&self) -> Option<&str> {
        self.document.as_ref().and_then(|d| d.status.as_deref())
    }

    pub fn video_id(&self) -> Option<&str> {
        self.document.as_ref().and_then(|d| d.video_id.as_deref())
    }
}

/// Split `NNN_rest` into its id and slug
pub fn parse_kit_folder(name: &str) -> Option<(&str, &str)> {
    let bytes = name.as_bytes();
    if bytes.len() < 5 || !bytes[..3].iter().all(u8::is_ascii_digit) || bytes[3] != b'_' {
        return None;
    }
    Some((&name[..3], &name[4..]))
}

/// Folder contents → display status
pub fn derive_display_status(kit_path: &Path, document: Option<&KitDocument>) -> DisplayStatus {
    let has_script = kit_path.join("script.txt").exists();
    if !has_script {
        return DisplayStatus::Empty;
    }
    let has_prompt = kit_path.join("prompt.txt").exists();
    let formula_name = document.map(|d| d.formula_name()).unwrap_or_default();
    let has_assets = formula(formula_name)
        .dirs
        .iter()
        .any(|dir| dir_has_entries(&kit_path.join(dir)));

    if has_prompt && has_assets {
        if is_linked(document.and_then(|d| d.video_id.as_deref())) {
            DisplayStatus::Published
        } else {
            DisplayStatus::Pending
        }
    } else {
        DisplayStatus::Setup
    }
}

/// Kits of one production folder
#[derive(Debug, Clone)]
pub struct KitLedger {
    production_dir: PathBuf,
}

impl KitLedger {
    pub fn new(production_dir: impl Into<PathBuf>) -> Self {
        Self {
            production_dir: production_dir.into(),
        }
    }

    pub fn production_dir(&self) -> &Path {
        &self.production_dir
    }

    /// Max existing id + 1, or 1 when there are none
    pub fn next_id(&self) -> Result<u32> {
        let max = self
            .kit_folders()?
            .iter()
            .filter_map(|name| parse_kit_folder(name))
            .filter_map(|(id, _)| id.parse::<u32>().ok())
            .max();
        Ok(max.map_or(1, |m| m + 1))
    }

    pub fn next_id_string(&self) -> Result<String> {
        Ok(format_kit_id(self.next_id()?))
    }

    /// All kits, sorted by folder name
    pub fn list(&self) -> Result<Vec<KitEntry>> {
        let mut kits = Vec::new();
        for folder in self.kit_folders()? {
            let Some((id, slug)) = parse_kit_folder(&folder) else {
                continue;
            };
            kits.push(Self::load_entry(&self.production_dir.join(&folder), id, slug));
        }
        Ok(kits)
    }

    /// Kit whose id matches `id` (`7` and `007` are the same kit)
    pub fn find(&self, id: &str) -> Result<Option<KitEntry>> {
        let wanted = normalize_id(id);
        Ok(self.list()?.into_iter().find(|k| k.id == wanted))
    }

    fn load_entry(path: &Path, id: &str, slug: &str) -> KitEntry {
        let yaml_path = path.join("kit.yaml");
        let document = match KitDocument::load(&yaml_path) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Unreadable {}: {}", yaml_path.display(), e);
                None
            }
        };
        let display_status = derive_display_status(path, document.as_ref());
        KitEntry {
            id: id.to_string(),
            slug: slug.to_string(),
            path: path.to_path_buf(),
            document,
            display_status,
        }
    }

    fn kit_folders(&self) -> Result<Vec<String>> {
        if !self.production_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.production_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// `7` → `007`; non-numeric ids are returned trimmed
pub fn normalize_id(id: &str) -> String {
    let id = id.trim();
    match id.parse::<u32>() {
        Ok(n) => format_kit_id(n),
        Err(_) => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn make_kit(production: &Path, folder: &str, yaml: Option<&str>) -> PathBuf {
        let path = production.join(folder);
        fs::create_dir_all(&path).unwrap();
        if let Some(yaml) = yaml {
            fs::write(path.join("kit.yaml"), yaml).unwrap();
        }
        path
    }

    #[test]
    fn test_parse_kit_folder() {
        assert_eq!(parse_kit_folder("007_melting_clock"), Some(("007", "melting_clock")));
        assert_eq!(parse_kit_folder("archive"), None);
        assert_eq!(parse_kit_folder("07_x"), None);
        assert_eq!(parse_kit_folder("007_"), None);
    }

    #[test]
    fn test_next_id() {
        let temp = TempDir::new().unwrap();
        let ledger = KitLedger::new(temp.path().join("production"));
        assert_eq!(ledger.next_id_string().unwrap(), "001");

        make_kit(ledger.production_dir(), "003_a", None);
        make_kit(ledger.production_dir(), "011_b", None);
        make_kit(ledger.production_dir(), "archive", None);
        assert_eq!(ledger.next_id_string().unwrap(), "012");
    }

    #[test]
    fn test_display_status_progression() {
        let temp = TempDir::new().unwrap();
        let kit = make_kit(
            temp.path(),
            "001_clock",
            Some("id: '001'\nname: clock\nstatus: draft\ningredients:\n  formula: loop_circular\n"),
        );
        let doc = || KitDocument::load(&kit.join("kit.yaml")).unwrap();

        assert_eq!(derive_display_status(&kit, doc().as_ref()), DisplayStatus::Empty);

        fs::write(kit.join("script.txt"), "s").unwrap();
        fs::write(kit.join("prompt.txt"), "p").unwrap();
        assert_eq!(derive_display_status(&kit, doc().as_ref()), DisplayStatus::Setup);

        // Assets in a directory of a different formula do not count
        fs::create_dir_all(kit.join("forward")).unwrap();
        fs::write(kit.join("forward").join("start_frame.png"), "x").unwrap();
        assert_eq!(derive_display_status(&kit, doc().as_ref()), DisplayStatus::Setup);

        fs::create_dir_all(kit.join("loop_source")).unwrap();
        fs::write(kit.join("loop_source").join("start_frame.png"), "x").unwrap();
        assert_eq!(derive_display_status(&kit, doc().as_ref()), DisplayStatus::Pending);

        fs::write(
            kit.join("kit.yaml"),
            "id: '001'\nvideo_id: TBD\ningredients:\n  formula: loop_circular\n",
        )
        .unwrap();
        assert_eq!(derive_display_status(&kit, doc().as_ref()), DisplayStatus::Pending);

        fs::write(
            kit.join("kit.yaml"),
            "id: '001'\nvideo_id: abc123\ningredients:\n  formula: loop_circular\n",
        )
        .unwrap();
        assert_eq!(derive_display_status(&kit, doc().as_ref()), DisplayStatus::Published);
    }

    #[test]
    fn test_list_and_find() {
        let temp = TempDir::new().unwrap();
        let ledger = KitLedger::new(temp.path());
        make_kit(temp.path(), "002_b", Some("id: '002'\nstatus: published\n"));
        make_kit(temp.path(), "001_a", Some("- broken\n"));
        make_kit(temp.path(), "notes", None);

        let kits = ledger.list().unwrap();
        assert_eq!(kits.len(), 2);
        assert_eq!(kits[0].folder_name(), "001_a");
        assert!(kits[0].document.is_none());
        assert_eq!(kits[1].stored_status(), Some("published"));

        assert_eq!(ledger.find("2").unwrap().unwrap().slug, "b");
        assert!(ledger.find("009").unwrap().is_none());
    }
}
