//! Per-channel knowledge folder
//!
//! `brain/state.json` holds identity, performance and audience facts,
//! `brain/themes/*.md` the per-theme playbooks, and `brain/learnings.md` a
//! dated list of insights grouped by category. Kit creation injects the
//! rendered [`Brain::prompt_context`] into every new prompt.

use crate::context::ChannelContext;
use crate::files::{read_json, read_optional, write_atomic, write_json};
use crate::kit::title_case;
use crate::time::{now, today};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

pub const DEFAULT_ACTIVE_THEME: &str = "loop";

/// Leading characters of learnings.md included in the prompt context
const LEARNINGS_CONTEXT_CHARS: usize = 2000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    pub name: String,
    pub niche: String,
    pub audience: String,
    pub tone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrainPerformance {
    pub total_videos: i64,
    pub avg_views: f64,
    pub best_format: String,
    pub best_post_time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Audience {
    pub wants: Vec<String>,
    pub complaints: Vec<String>,
    pub sentiment: f64,
}

/// `state.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrainState {
    pub version: String,
    pub updated_at: Option<String>,
    pub identity: Identity,
    pub performance: BrainPerformance,
    pub audience: Audience,
    pub active_theme: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for BrainState {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            updated_at: None,
            identity: Identity::default(),
            performance: BrainPerformance::default(),
            audience: Audience::default(),
            active_theme: DEFAULT_ACTIVE_THEME.to_string(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Sections of learnings.md
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearningCategory {
    Performance,
    Audience,
    Gaps,
    Failures,
}

impl LearningCategory {
    pub const NAMES: [&'static str; 4] = ["performance", "audience", "gaps", "failures"];

    pub fn header(&self) -> &'static str {
        match self {
            LearningCategory::Performance => "## Performance Insights",
            LearningCategory::Audience => "## Audience Insights",
            LearningCategory::Gaps => "## Market Gaps",
            LearningCategory::Failures => "## Failed Experiments",
        }
    }
}

impl FromStr for LearningCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "performance" => Ok(LearningCategory::Performance),
            "audience" => Ok(LearningCategory::Audience),
            "gaps" => Ok(LearningCategory::Gaps),
            "failures" => Ok(LearningCategory::Failures),
            other => Err(Error::InvalidInput(format!(
                "Invalid category '{}'. Use: {}",
                other,
                Self::NAMES.join(", ")
            ))),
        }
    }
}

impl fmt::Display for LearningCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LearningCategory::Performance => "performance",
            LearningCategory::Audience => "audience",
            LearningCategory::Gaps => "gaps",
            LearningCategory::Failures => "failures",
        };
        f.write_str(name)
    }
}

struct BuiltinTheme {
    key: &'static str,
    name: &'static str,
    format: &'static str,
    vibe: &'static str,
    style: &'static str,
    action: &'static str,
    physics: &'static str,
    camera: &'static str,
    script: &'static str,
}

const BUILTIN_THEMES: [BuiltinTheme; 3] = [
    BuiltinTheme {
        key: "loop",
        name: "Brain Rot Loop",
        format: "16s seamless loop (8s forward + 8s reverse)",
        vibe: "Satisfying, hypnotic, infinite scroll bait",
        style: "Macro, 8k, neon, high contrast, octane render",
        action: "NO FADE. Continuous physics simulation",
        physics: "Rigid body, fluid, particles",
        camera: "Stationary, shallow DOF",
        script: "Shower Thoughts / Uncomfortable Facts (Max 25 words)",
    },
    BuiltinTheme {
        key: "advice",
        name: "Corny Cursed Advice",
        format: "30s cursed advice with disaster",
        vibe: "Dark humor, absurd, unexpected outcome",
        style: "Stylized 3D, clean stock footage aesthetic",
        action: "POV character follows bad advice, disaster ensues",
        physics: "Exaggerated but grounded",
        camera: "Dynamic, follows action, reaction shots",
        script: "Narrator gives terrible advice, deadpan delivery",
    },
    BuiltinTheme {
        key: "cinematic",
        name: "Cinematic Realism",
        format: "30-60s micro-story",
        vibe: "Film-quality, emotional, narrative-driven",
        style: "Photorealistic, moody lighting, anamorphic",
        action: "Single simple action with emotional weight",
        physics: "Realistic, subtle",
        camera: "Dolly, crane, handheld, 35mm/85mm lens",
        script: "Micro-Narrative / Spoken Poetry, first-person",
    },
];

impl BuiltinTheme {
    fn render(&self, date: &str) -> String {
        format!(
            "# {name} Theme\n\n\
             > Prompt formula and quality markers for {name} format.\n\
             > Last updated: {date}\n\n\
             ## Format\n{format}\n\n\
             ## Vibe\n{vibe}\n\n\
             ## Prompt Formula\n```\n\
             [STYLE]: {style}\n\
             [ACTION]: {action}\n\
             [PHYSICS]: {physics}\n\
             [CAMERA]: {camera}\n```\n\n\
             ## Script Style\n{script}\n\n\
             ## Anti-AI Tokens (Required)\n\
             - Subtle film grain, 16mm film texture\n\
             - Gentle handheld camera shake\n\
             - Atmospheric haze, dust particles\n\
             - Natural physics, weight and momentum\n\n\
             ## Proven Hooks\n\
             | Pattern | Win Rate | Uses |\n\
             |---------|----------|------|\n\
             | (Track successful hooks here) | | |\n\n\
             ## Notes\n(Any learnings specific to this theme)\n",
            name = self.name,
            date = date,
            format = self.format,
            vibe = self.vibe,
            style = self.style,
            action = self.action,
            physics = self.physics,
            camera = self.camera,
            script = self.script,
        )
    }
}

fn default_learnings(channel_name: &str, date: &str) -> String {
    format!(
        "# {channel_name} Learnings\n\n\
         > Auto-generated insights from performance data and manual entries.\n\
         > Last updated: {date}\n\n\
         ## Performance Insights\n- (Auto-populated after sync runs)\n\n\
         ## Audience Insights\n- (Auto-populated after scan runs)\n\n\
         ## Market Gaps\n- (Auto-populated after scout runs)\n\n\
         ## Failed Experiments\n- (Track what didn't work to avoid repeating)\n"
    )
}

/// Insert a dated entry at the end of `header`'s section, appending the
/// section when it is missing
fn insert_learning(content: &str, header: &str, entry: &str) -> String {
    match content.split_once(header) {
        Some((before, rest)) => {
            let new_rest = match rest.find("\n## ") {
                Some(next) => format!("{}{}{}", rest[..next].trim_end(), entry, &rest[next..]),
                None => format!("{}{}\n", rest.trim_end(), entry),
            };
            format!("{}{}{}", before, header, new_rest)
        }
        None => format!("{}\n\n{}\n{}\n", content, header, entry),
    }
}

/// Handle to a channel's `brain/` folder
#[derive(Debug, Clone)]
pub struct Brain {
    path: PathBuf,
    channel_name: String,
}

impl Brain {
    pub fn new(path: impl Into<PathBuf>, channel_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            channel_name: channel_name.into(),
        }
    }

    pub fn for_channel(ctx: &ChannelContext) -> Self {
        Self::new(ctx.brain_path(), ctx.name.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state_path(&self) -> PathBuf {
        self.path.join("state.json")
    }

    pub fn themes_path(&self) -> PathBuf {
        self.path.join("themes")
    }

    pub fn learnings_path(&self) -> PathBuf {
        self.path.join("learnings.md")
    }

    pub fn protocols_path(&self) -> PathBuf {
        self.path.join("protocols.md")
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Create whichever brain files are missing; existing files are kept
    pub fn init(&self) -> Result<()> {
        std::fs::create_dir_all(self.themes_path())?;

        let date = today().format("%Y-%m-%d").to_string();
        let display_name = title_case(&self.channel_name.replace('_', " "));

        if !self.state_path().exists() {
            let mut state = BrainState::default();
            state.updated_at = Some(now().to_rfc3339());
            state.identity.name = display_name.clone();
            write_json(&self.state_path(), &state)?;
        }

        for theme in &BUILTIN_THEMES {
            let theme_path = self.themes_path().join(format!("{}.md", theme.key));
            if !theme_path.exists() {
                write_atomic(&theme_path, theme.render(&date).as_bytes())?;
            }
        }

        if !self.learnings_path().exists() {
            write_atomic(
                &self.learnings_path(),
                default_learnings(&display_name, &date).as_bytes(),
            )?;
        }

        info!(path = %self.path.display(), "Brain initialized");
        Ok(())
    }

    /// Missing state reads as defaults
    pub fn load_state(&self) -> Result<BrainState> {
        Ok(read_json(&self.state_path())?.unwrap_or_default())
    }

    pub fn save_state(&self, state: &mut BrainState) -> Result<()> {
        state.updated_at = Some(now().to_rfc3339());
        write_json(&self.state_path(), state)
    }

    pub fn set_active_theme(&self, theme: &str) -> Result<()> {
        let mut state = self.load_state()?;
        state.active_theme = theme.to_string();
        self.save_state(&mut state)
    }

    /// Theme names from `themes/*.md`, sorted
    pub fn list_themes(&self) -> Result<Vec<String>> {
        let dir = self.themes_path();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut themes = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "md") {
                if let Some(stem) = path.file_stem() {
                    themes.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        themes.sort();
        Ok(themes)
    }

    /// Playbook for `theme`, falling back to `loop.md`, empty when neither exists
    pub fn load_playbook(&self, theme: &str) -> Result<String> {
        let themes = self.themes_path();
        if let Some(text) = read_optional(&themes.join(format!("{}.md", theme)))? {
            return Ok(text);
        }
        Ok(read_optional(&themes.join(format!("{}.md", DEFAULT_ACTIVE_THEME)))?.unwrap_or_default())
    }

    pub fn load_learnings(&self) -> Result<String> {
        Ok(read_optional(&self.learnings_path())?.unwrap_or_default())
    }

    pub fn load_protocols(&self) -> Result<Option<String>> {
        read_optional(&self.protocols_path())
    }

    /// Append `- [YYYY-MM-DD] insight (Source: evidence)` to a section
    pub fn add_learning(
        &self,
        category: LearningCategory,
        insight: &str,
        evidence: Option<&str>,
    ) -> Result<()> {
        if !self.learnings_path().exists() {
            self.init()?;
        }
        let content = self.load_learnings()?;

        let mut entry = format!("\n- [{}] {}", today().format("%Y-%m-%d"), insight);
        if let Some(source) = evidence.filter(|s| !s.is_empty()) {
            entry.push_str(&format!(" (Source: {})", source));
        }

        let updated = insert_learning(&content, category.header(), &entry);
        write_atomic(&self.learnings_path(), updated.as_bytes())
    }

    /// Context block injected into new kit prompts
    pub fn prompt_context(&self, theme_override: Option<&str>) -> Result<String> {
        let state = self.load_state()?;
        let theme = theme_override.unwrap_or(state.active_theme.as_str());
        let playbook = self.load_playbook(theme)?;
        let learnings = self.load_learnings()?;

        let or_default = |value: &str, fallback: &str| {
            if value.is_empty() {
                fallback.to_string()
            } else {
                value.to_string()
            }
        };
        let bullets = |items: &[String], empty: &str| {
            if items.is_empty() {
                empty.to_string()
            } else {
                items
                    .iter()
                    .map(|item| format!("- {}", item))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        };
        let recent: String = if learnings.is_empty() {
            "(No learnings yet)".to_string()
        } else {
            learnings.chars().take(LEARNINGS_CONTEXT_CHARS).collect()
        };

        Ok(format!(
            "\n## Channel Identity\n\
             - Name: {}\n\
             - Niche: {}\n\
             - Audience: {}\n\
             - Tone: {}\n\n\
             ## Active Theme: {}\n\n\
             {}\n\n\
             ## Audience Wants\n{}\n\n\
             ## Audience Complaints (Avoid These)\n{}\n\n\
             ## Recent Learnings\n{}\n",
            or_default(&state.identity.name, "Unknown"),
            or_default(&state.identity.niche, "Not defined"),
            or_default(&state.identity.audience, "Not defined"),
            or_default(&state.identity.tone, "Not defined"),
            theme,
            playbook,
            bullets(&state.audience.wants, "- (No data yet)"),
            bullets(&state.audience.complaints, "- (No complaints recorded)"),
            recent,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn brain(temp: &TempDir) -> Brain {
        Brain::new(temp.path().join("brain"), "cat_loops")
    }

    #[test]
    fn test_init_creates_files_once() {
        let temp = TempDir::new().unwrap();
        let brain = brain(&temp);
        assert!(!brain.exists());

        brain.init().unwrap();
        assert!(brain.state_path().exists());
        assert!(brain.learnings_path().exists());
        assert_eq!(brain.list_themes().unwrap(), vec!["advice", "cinematic", "loop"]);

        let state = brain.load_state().unwrap();
        assert_eq!(state.identity.name, "Cat Loops");
        assert_eq!(state.active_theme, "loop");

        // A second init keeps edits
        std::fs::write(brain.learnings_path(), "custom").unwrap();
        brain.init().unwrap();
        assert_eq!(brain.load_learnings().unwrap(), "custom");
    }

    #[test]
    fn test_theme_file_sections() {
        let temp = TempDir::new().unwrap();
        let brain = brain(&temp);
        brain.init().unwrap();

        let playbook = brain.load_playbook("cinematic").unwrap();
        assert!(playbook.starts_with("# Cinematic Realism Theme"));
        for section in ["## Format", "## Vibe", "## Prompt Formula", "## Script Style", "## Proven Hooks", "## Notes"] {
            assert!(playbook.contains(section), "missing {}", section);
        }
        // Unknown themes fall back to loop
        assert!(brain.load_playbook("voxel").unwrap().starts_with("# Brain Rot Loop Theme"));
    }

    #[test]
    fn test_add_learning_lands_in_its_section() {
        let temp = TempDir::new().unwrap();
        let brain = brain(&temp);
        brain.init().unwrap();

        brain
            .add_learning(LearningCategory::Audience, "Viewers love purring", Some("Manual entry"))
            .unwrap();

        let text = brain.load_learnings().unwrap();
        let audience = text.find("## Audience Insights").unwrap();
        let gaps = text.find("## Market Gaps").unwrap();
        let entry = text.find("Viewers love purring (Source: Manual entry)").unwrap();
        assert!(audience < entry && entry < gaps);
    }

    #[test]
    fn test_insert_learning_edge_cases() {
        assert_eq!(
            insert_learning("# L\n\n## Failed Experiments\n- old\n", "## Failed Experiments", "\n- new"),
            "# L\n\n## Failed Experiments\n- old\n- new\n"
        );
        assert_eq!(
            insert_learning("# L", "## Market Gaps", "\n- gap"),
            "# L\n\n## Market Gaps\n\n- gap\n"
        );
    }

    #[test]
    fn test_set_theme_and_prompt_context() {
        let temp = TempDir::new().unwrap();
        let brain = brain(&temp);
        brain.init().unwrap();
        brain.set_active_theme("cinematic").unwrap();

        let mut state = brain.load_state().unwrap();
        assert_eq!(state.active_theme, "cinematic");
        state.audience.wants = vec!["more cats".to_string()];
        brain.save_state(&mut state).unwrap();

        let context = brain.prompt_context(None).unwrap();
        assert!(context.contains("## Active Theme: cinematic"));
        assert!(context.contains("# Cinematic Realism Theme"));
        assert!(context.contains("## Audience Wants\n- more cats"));
        assert!(context.contains("- (No complaints recorded)"));
        assert!(context.contains("- Niche: Not defined"));

        let overridden = brain.prompt_context(Some("loop")).unwrap();
        assert!(overridden.contains("## Active Theme: loop"));
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("Gaps".parse::<LearningCategory>().unwrap(), LearningCategory::Gaps);
        assert!("misc".parse::<LearningCategory>().is_err());
    }
}
