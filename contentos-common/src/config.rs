//! Configuration loading and root folder resolution

use crate::files::{read_json, write_json};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming the workspace root
pub const ROOT_ENV_VAR: &str = "CONTENTOS_ROOT";

/// Workspace-level folder holding config.json and credentials
pub const CONTENTOS_DIR: &str = ".contentos";

/// Folder holding one subfolder per channel
pub const CHANNELS_DIR: &str = "channels";

/// Per-channel config file name
pub const CHANNEL_CONFIG_FILE: &str = ".channel.json";

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. `CONTENTOS_ROOT` environment variable
/// 3. `root_folder` key in `~/.config/contentos/config.toml`
/// 4. Current working directory (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(config_path) = user_config_file() {
        match root_folder_from_toml(&config_path) {
            Ok(Some(root)) => return root,
            Ok(None) => {}
            Err(e) => warn!("Ignoring {}: {}", config_path.display(), e),
        }
    }

    // Priority 4: current directory
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Path of the per-user TOML file, if the platform has a config dir
fn user_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("contentos").join("config.toml"))
}

/// Read `root_folder` from a TOML file. Missing file → `Ok(None)`.
pub fn root_folder_from_toml(path: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&text)
        .map_err(|e| Error::Config(format!("Invalid TOML in {}: {}", path.display(), e)))?;
    Ok(value
        .get("root_folder")
        .and_then(|v| v.as_str())
        .map(PathBuf::from))
}

/// Toggleable modules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    pub llm_swarm: bool,
    pub scout_agent: bool,
    pub cloud_sync: bool,
    pub ollama_autostart: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            llm_swarm: false,
            scout_agent: true,
            cloud_sync: false,
            ollama_autostart: false,
        }
    }
}

impl FeaturesConfig {
    /// Flag names accepted by `config enable|disable`
    pub const NAMES: [&'static str; 4] = ["llm_swarm", "scout_agent", "cloud_sync", "ollama_autostart"];

    pub fn get(&self, name: &str) -> Option<bool> {
        match name {
            "llm_swarm" => Some(self.llm_swarm),
            "scout_agent" => Some(self.scout_agent),
            "cloud_sync" => Some(self.cloud_sync),
            "ollama_autostart" => Some(self.ollama_autostart),
            _ => None,
        }
    }

    pub fn set(&mut self, name: &str, enabled: bool) -> Result<()> {
        let slot = match name {
            "llm_swarm" => &mut self.llm_swarm,
            "scout_agent" => &mut self.scout_agent,
            "cloud_sync" => &mut self.cloud_sync,
            "ollama_autostart" => &mut self.ollama_autostart,
            other => {
                return Err(Error::InvalidInput(format!(
                    "Unknown feature '{}'. Available: {}",
                    other,
                    Self::NAMES.join(", ")
                )))
            }
        };
        *slot = enabled;
        Ok(())
    }

    /// (name, enabled) pairs in display order
    pub fn entries(&self) -> Vec<(&'static str, bool)> {
        Self::NAMES
            .iter()
            .map(|name| (*name, self.get(name).unwrap_or(false)))
            .collect()
    }
}

/// `.contentos/config.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub version: String,
    pub active_channel: Option<String>,
    pub default_theme: String,
    pub auto_sync_on_publish: bool,
    pub features: FeaturesConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            active_channel: None,
            default_theme: "loop".to_string(),
            auto_sync_on_publish: true,
            features: FeaturesConfig::default(),
        }
    }
}

impl GlobalConfig {
    pub fn path(root: &Path) -> PathBuf {
        root.join(CONTENTOS_DIR).join("config.json")
    }

    /// Load from `<root>/.contentos/config.json`; defaults when missing
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::path(root);
        match read_json::<Self>(&path) {
            Ok(Some(config)) => Ok(config),
            Ok(None) => {
                debug!("No global config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(Error::Json(e)) => Err(Error::Config(format!(
                "Invalid JSON in {}: {}",
                path.display(),
                e
            ))),
            Err(e) => Err(e),
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        write_json(&Self::path(root), self)
    }
}

/// `channels/<name>/.channel.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub name: String,
    pub handle: String,
    pub youtube_channel_id: String,
    pub themes: Vec<String>,
    pub production_prefix: String,
    pub default_script_style: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            handle: String::new(),
            youtube_channel_id: String::new(),
            themes: vec!["loop".to_string(), "cinematic".to_string(), "voxel".to_string()],
            production_prefix: "project".to_string(),
            default_script_style: "adrenaline_hook".to_string(),
        }
    }
}

impl ChannelConfig {
    pub fn path(channel_dir: &Path) -> PathBuf {
        channel_dir.join(CHANNEL_CONFIG_FILE)
    }

    /// Load the channel config, `None` when the file is missing
    pub fn load(channel_dir: &Path) -> Result<Option<Self>> {
        read_json(&Self::path(channel_dir))
    }

    pub fn save(&self, channel_dir: &Path) -> Result<()> {
        write_json(&Self::path(channel_dir), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_global_config_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = GlobalConfig::load(temp.path()).unwrap();
        assert_eq!(config, GlobalConfig::default());
        assert!(config.features.scout_agent);
        assert!(!config.features.ollama_autostart);
    }

    #[test]
    fn test_global_config_partial_json_fills_defaults() {
        let temp = TempDir::new().unwrap();
        let path = GlobalConfig::path(temp.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r#"{"active_channel": "rotnation", "features": {"cloud_sync": true}, "extra": 1}"#,
        )
        .unwrap();

        let config = GlobalConfig::load(temp.path()).unwrap();
        assert_eq!(config.active_channel.as_deref(), Some("rotnation"));
        assert_eq!(config.default_theme, "loop");
        assert!(config.features.cloud_sync);
        assert!(config.features.scout_agent);
    }

    #[test]
    fn test_global_config_invalid_json_is_config_error() {
        let temp = TempDir::new().unwrap();
        let path = GlobalConfig::path(temp.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(GlobalConfig::load(temp.path()), Err(Error::Config(_))));
    }

    #[test]
    fn test_global_config_save_and_reload() {
        let temp = TempDir::new().unwrap();
        let mut config = GlobalConfig::default();
        config.active_channel = Some("voxels".to_string());
        config.features.set("llm_swarm", true).unwrap();
        config.save(temp.path()).unwrap();

        assert_eq!(GlobalConfig::load(temp.path()).unwrap(), config);
    }

    #[test]
    fn test_feature_set_rejects_unknown_name() {
        let mut features = FeaturesConfig::default();
        let err = features.set("telepathy", true).unwrap_err();
        assert!(err.to_string().contains("llm_swarm"));
        assert_eq!(features.get("telepathy"), None);
    }

    #[test]
    fn test_channel_config_defaults() {
        let config = ChannelConfig::default();
        assert_eq!(config.themes, vec!["loop", "cinematic", "voxel"]);
        assert_eq!(config.production_prefix, "project");
    }

    #[test]
    fn test_root_folder_from_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        assert!(root_folder_from_toml(&path).unwrap().is_none());

        std::fs::write(&path, "root_folder = \"/srv/contentos\"\n").unwrap();
        assert_eq!(
            root_folder_from_toml(&path).unwrap(),
            Some(PathBuf::from("/srv/contentos"))
        );

        std::fs::write(&path, "other = 1\n").unwrap();
        assert!(root_folder_from_toml(&path).unwrap().is_none());

        std::fs::write(&path, "root_folder = [").unwrap();
        assert!(root_folder_from_toml(&path).is_err());
    }
}
