//! Active channel resolution and channel folder layout

use crate::config::{ChannelConfig, GlobalConfig, CHANNELS_DIR, CONTENTOS_DIR};
use crate::files::list_subdirs;
use crate::kit::{slugify, title_case};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// A resolved channel: its folder, its config and the global config
#[derive(Debug, Clone)]
pub struct ChannelContext {
    pub name: String,
    pub path: PathBuf,
    pub root: PathBuf,
    pub config: ChannelConfig,
    pub global_config: GlobalConfig,
}

impl ChannelContext {
    pub fn analytics_path(&self) -> PathBuf {
        self.path.join("analytics")
    }

    pub fn production_path(&self) -> PathBuf {
        self.path.join("production")
    }

    pub fn archive_path(&self) -> PathBuf {
        self.production_path().join("archive")
    }

    pub fn strategy_path(&self) -> PathBuf {
        self.path.join("strategy")
    }

    /// Legacy plural folder, still preferred for the scoreboard when present
    pub fn strategies_path(&self) -> PathBuf {
        self.path.join("strategies")
    }

    pub fn brain_path(&self) -> PathBuf {
        self.path.join("brain")
    }

    pub fn db_path(&self) -> PathBuf {
        self.analytics_path().join("contentos.db")
    }

    /// Bearer token stored next to the channel analytics
    pub fn channel_token_path(&self) -> PathBuf {
        self.analytics_path().join("token.json")
    }

    /// Bearer token shared by every channel of the workspace
    pub fn shared_token_path(&self) -> PathBuf {
        credentials_dir(&self.root).join("token.json")
    }

    /// `strategies/SCOREBOARD.md` if that legacy file exists, else `strategy/SCOREBOARD.md`
    pub fn scoreboard_path(&self) -> PathBuf {
        let legacy = self.strategies_path().join("SCOREBOARD.md");
        if legacy.exists() {
            legacy
        } else {
            self.strategy_path().join("SCOREBOARD.md")
        }
    }

    /// Display name, falling back to the folder name
    pub fn display_name(&self) -> &str {
        if self.config.name.is_empty() {
            &self.name
        } else {
            &self.config.name
        }
    }
}

/// `<root>/.contentos/credentials`
pub fn credentials_dir(root: &Path) -> PathBuf {
    root.join(CONTENTOS_DIR).join("credentials")
}

/// One row of `channel list`
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSummary {
    pub name: String,
    pub display_name: String,
    pub handle: String,
    pub is_active: bool,
}

/// Resolves channels under a workspace root
#[derive(Debug, Clone)]
pub struct ContextManager {
    root: PathBuf,
    global_config: GlobalConfig,
}

impl ContextManager {
    /// Load the global config of the workspace at `root`
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let global_config = GlobalConfig::load(&root)?;
        Ok(Self { root, global_config })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn channels_dir(&self) -> PathBuf {
        self.root.join(CHANNELS_DIR)
    }

    pub fn global_config(&self) -> &GlobalConfig {
        &self.global_config
    }

    /// Apply `update` to the global config and persist it
    pub fn update_global_config<F>(&mut self, update: F) -> Result<()>
    where
        F: FnOnce(&mut GlobalConfig) -> Result<()>,
    {
        update(&mut self.global_config)?;
        self.global_config.save(&self.root)
    }

    pub fn active_channel_name(&self) -> Option<&str> {
        self.global_config
            .active_channel
            .as_deref()
            .filter(|name| !name.is_empty())
    }

    /// Context of the active channel, or an error naming what is missing
    pub fn current_context(&self) -> Result<ChannelContext> {
        let name = self.active_channel_name().ok_or_else(|| {
            Error::Config(
                "No active channel. Run `contentos channel use <name>` or `contentos channel create <name>`"
                    .to_string(),
            )
        })?;
        self.context(name)?.ok_or_else(|| {
            Error::NotFound(format!(
                "Active channel '{}' has no folder under {}",
                name,
                self.channels_dir().display()
            ))
        })
    }

    /// Context for a named channel, `None` when its folder is missing
    pub fn context(&self, name: &str) -> Result<Option<ChannelContext>> {
        let path = self.channels_dir().join(name);
        if !path.is_dir() {
            return Ok(None);
        }
        let config = ChannelConfig::load(&path)?.unwrap_or_else(|| ChannelConfig {
            name: name.to_string(),
            ..ChannelConfig::default()
        });
        Ok(Some(ChannelContext {
            name: name.to_string(),
            path,
            root: self.root.clone(),
            config,
            global_config: self.global_config.clone(),
        }))
    }

    /// Make `name` the active channel
    pub fn use_channel(&mut self, name: &str) -> Result<ChannelContext> {
        if !self.channels_dir().join(name).is_dir() {
            let available = list_subdirs(&self.channels_dir())?;
            return Err(Error::NotFound(format!(
                "Channel '{}' not found. Available: {}",
                name,
                if available.is_empty() {
                    "(none)".to_string()
                } else {
                    available.join(", ")
                }
            )));
        }
        self.update_global_config(|config| {
            config.active_channel = Some(name.to_string());
            Ok(())
        })?;
        info!(channel = %name, "Switched active channel");
        self.context(name)?
            .ok_or_else(|| Error::Internal(format!("Channel '{}' vanished", name)))
    }

    /// All channel folders with their handle and active marker
    pub fn list_channels(&self) -> Result<Vec<ChannelSummary>> {
        let active = self.active_channel_name();
        let mut channels = Vec::new();
        for name in list_subdirs(&self.channels_dir())? {
            let config = ChannelConfig::load(&self.channels_dir().join(&name))
                .ok()
                .flatten();
            let (display_name, handle) = match config {
                Some(c) if !c.name.is_empty() => (c.name, c.handle),
                Some(c) => (name.clone(), c.handle),
                None => (name.clone(), String::new()),
            };
            channels.push(ChannelSummary {
                is_active: active == Some(name.as_str()),
                name,
                display_name,
                handle,
            });
        }
        Ok(channels)
    }

    /// Create a channel folder skeleton; refuses existing channels
    pub fn create_channel(&self, name: &str, handle: Option<&str>) -> Result<ChannelContext> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(Error::InvalidInput("Channel name is empty".to_string()));
        }
        let path = self.channels_dir().join(&slug);
        if path.exists() {
            return Err(Error::InvalidInput(format!("Channel '{}' already exists", slug)));
        }

        for sub in ["analytics", "production", "strategy"] {
            std::fs::create_dir_all(path.join(sub))?;
        }

        let config = ChannelConfig {
            name: title_case(&name.replace('_', " ")),
            handle: handle.unwrap_or_default().to_string(),
            ..ChannelConfig::default()
        };
        config.save(&path)?;
        info!(channel = %slug, path = %path.display(), "Created channel");

        Ok(ChannelContext {
            name: slug,
            path,
            root: self.root.clone(),
            config,
            global_config: self.global_config.clone(),
        })
    }
}
