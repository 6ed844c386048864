//! Ingredient extraction from a kit's `prompt.txt`
//!
//! The local LLM is asked for a JSON object first. When it is unreachable
//! or answers with something unusable, a keyword scan of the prompt fills
//! the same fields.

use super::ollama_client::OllamaClient;
use contentos_common::kit::Ingredients;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Characters of the prompt sent to the LLM
const PROMPT_EXCERPT_CHARS: usize = 3000;
/// Characters searched for a `?` when guessing a question hook
const QUESTION_WINDOW_CHARS: usize = 200;

pub const DEFAULT_DURATION_SECONDS: i64 = 16;
pub const DEFAULT_CLIP_COUNT: i64 = 2;

const EXTRACTION_SYSTEM_PROMPT: &str =
    "You are a content analyst. Extract structured data from video prompts. Return only valid JSON.";
const EXTRACTION_TEMPERATURE: f32 = 0.3;

/// Keyword → emotion, first hit wins
const EMOTION_KEYWORDS: [(&str, &str); 11] = [
    ("love", "Love"),
    ("trust", "Trust"),
    ("curious", "Curiosity"),
    ("satisfy", "Satisfaction"),
    ("nostalg", "Nostalgia"),
    ("fomo", "FOMO"),
    ("humor", "Humor"),
    ("funny", "Humor"),
    ("adopt", "Love"),
    ("emotional", "Love"),
    ("dream", "Curiosity"),
];

/// How a set of ingredients was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    Llm,
    Patterns,
}

/// Ingredients pulled out of one prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedIngredients {
    pub hook_type: String,
    pub audio_style: String,
    pub visual_style: String,
    pub physics_type: String,
    pub emotion: String,
    pub duration_seconds: i64,
    pub clip_count: i64,
}

impl ExtractedIngredients {
    /// Read the LLM's JSON answer; missing fields take their defaults.
    ///
    /// Returns `None` when the text is not a JSON object.
    pub fn from_llm_json(text: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(text.trim()).ok()?;
        let object = value.as_object()?;

        let text_field = |key: &str, default: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(default)
                .to_string()
        };
        let int_field = |key: &str, default: i64| {
            object
                .get(key)
                .and_then(|v| {
                    v.as_i64()
                        .or_else(|| v.as_f64().map(|f| f.round() as i64))
                        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
                })
                .unwrap_or(default)
        };

        Some(Self {
            hook_type: text_field("hook_type", "Unknown"),
            audio_style: text_field("audio_style", "Unknown"),
            visual_style: text_field("visual_style", "Unknown"),
            physics_type: text_field("physics_type", "None"),
            emotion: text_field("emotion", "Unknown"),
            duration_seconds: int_field("duration_seconds", DEFAULT_DURATION_SECONDS),
            clip_count: int_field("clip_count", DEFAULT_CLIP_COUNT),
        })
    }

    /// Overwrite the extracted fields of `ingredients`, keeping theme and formula
    pub fn apply(&self, ingredients: &mut Ingredients) {
        ingredients.hook_type = Some(self.hook_type.clone());
        ingredients.audio_style = Some(self.audio_style.clone());
        ingredients.visual_style = Some(self.visual_style.clone());
        ingredients.physics_type = Some(self.physics_type.clone());
        ingredients.emotion = Some(self.emotion.clone());
        ingredients.duration = Some(self.duration_seconds);
        ingredients.clip_count = Some(self.clip_count);
    }
}

fn duration_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\s*(?:second|sec|s\b)").ok())
        .as_ref()
}

fn clip_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\s*(?:clip|scene|segment)").ok())
        .as_ref()
}

fn first_number(re: Option<&Regex>, text: &str) -> Option<i64> {
    re?.captures(text)?.get(1)?.as_str().parse().ok()
}

/// Keyword scan used when no LLM answer is available
pub fn extract_patterns(prompt: &str) -> ExtractedIngredients {
    let lower = prompt.to_lowercase();
    let has = |word: &str| lower.contains(word);
    let has_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    let opening: String = prompt.chars().take(QUESTION_WINDOW_CHARS).collect();
    let hook_type = if has("pov") {
        if has_any(&["adopt", "chose", "love", "trust", "emotional"]) {
            "POV_Emotional"
        } else {
            "POV_Relatable"
        }
    } else if opening.contains('?') {
        "Question"
    } else if has_any(&["tutorial", "how to"]) {
        "Tutorial"
    } else {
        "Unknown"
    };

    let audio_style = if has_any(&["asmr", "purr"]) {
        "ASMR_Purr"
    } else if has("music") {
        "Music_Emotional"
    } else if has_any(&["voiceover", "narrator"]) {
        "Voiceover"
    } else {
        "Ambient_Silence"
    };

    let visual_style = if has_any(&["macro", "close-up", "closeup"]) {
        "Macro_Closeup"
    } else if has_any(&["pov", "first person"]) {
        "POV_FirstPerson"
    } else if has_any(&["loop", "seamless"]) {
        "Loop_Seamless"
    } else if has("cinematic") {
        "Cinematic_Smooth"
    } else {
        "Handheld_Raw"
    };

    let physics_type = if has("rigid") {
        "Rigid_Body"
    } else if has_any(&["fluid", "water"]) {
        "Fluid_Sim"
    } else if has("particle") {
        "Particle_FX"
    } else if has("static") {
        "Static_Hold"
    } else {
        "Organic_Motion"
    };

    let emotion = EMOTION_KEYWORDS
        .iter()
        .find(|(keyword, _)| has(keyword))
        .map_or("Trust", |(_, emotion)| emotion);

    ExtractedIngredients {
        hook_type: hook_type.to_string(),
        audio_style: audio_style.to_string(),
        visual_style: visual_style.to_string(),
        physics_type: physics_type.to_string(),
        emotion: emotion.to_string(),
        duration_seconds: first_number(duration_regex(), &lower).unwrap_or(DEFAULT_DURATION_SECONDS),
        clip_count: first_number(clip_regex(), &lower).unwrap_or(DEFAULT_CLIP_COUNT),
    }
}

/// Instruction sent to the LLM for one prompt
pub fn extraction_prompt(prompt: &str) -> String {
    let excerpt: String = prompt.chars().take(PROMPT_EXCERPT_CHARS).collect();
    format!(
        r#"Analyze this video production prompt and extract the DNA ingredients.

PROMPT CONTENT:
{excerpt}

Extract these ingredients as a JSON object:
{{
    "hook_type": "<one of: POV_Emotional, POV_Relatable, Question, Statement, Confrontational, Silent, Tutorial>",
    "audio_style": "<one of: ASMR_Purr, Ambient_Silence, Music_Emotional, Music_Upbeat, SFX_Heavy, Voiceover>",
    "visual_style": "<one of: Macro_Closeup, Wide_Establishing, POV_FirstPerson, Handheld_Raw, Cinematic_Smooth, Loop_Seamless>",
    "physics_type": "<one of: Organic_Motion, Rigid_Body, Fluid_Sim, Particle_FX, Static_Hold, None>",
    "emotion": "<primary emotion: Trust, Love, Curiosity, Satisfaction, Nostalgia, FOMO, Humor>",
    "duration_seconds": <number>,
    "clip_count": <number>
}}

Return ONLY valid JSON, no explanation."#
    )
}

/// Extracts ingredients, preferring the LLM when one is attached
pub struct Enricher {
    llm: Option<OllamaClient>,
}

impl Enricher {
    pub fn new(llm: Option<OllamaClient>) -> Self {
        Self { llm }
    }

    /// Pattern extraction only
    pub fn offline() -> Self {
        Self { llm: None }
    }

    pub fn uses_llm(&self) -> bool {
        self.llm.is_some()
    }

    pub async fn extract(&self, prompt: &str) -> (ExtractedIngredients, ExtractionSource) {
        if let Some(llm) = &self.llm {
            match llm
                .chat(
                    &extraction_prompt(prompt),
                    EXTRACTION_SYSTEM_PROMPT,
                    None,
                    EXTRACTION_TEMPERATURE,
                    true,
                )
                .await
            {
                Ok(answer) => match ExtractedIngredients::from_llm_json(&answer) {
                    Some(extracted) => return (extracted, ExtractionSource::Llm),
                    None => warn!("LLM answer was not a JSON object, using pattern extraction"),
                },
                Err(e) => warn!("LLM extraction failed, using pattern extraction: {}", e),
            }
        }
        debug!("Pattern extraction");
        (extract_patterns(prompt), ExtractionSource::Patterns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_for_pov_adoption_prompt() {
        let prompt = "POV: you adopt a kitten. Macro shot, soft purr ASMR, 12 seconds, 3 clips.";
        let extracted = extract_patterns(prompt);

        assert_eq!(extracted.hook_type, "POV_Emotional");
        assert_eq!(extracted.audio_style, "ASMR_Purr");
        assert_eq!(extracted.visual_style, "Macro_Closeup");
        assert_eq!(extracted.physics_type, "Organic_Motion");
        assert_eq!(extracted.emotion, "Love");
        assert_eq!(extracted.duration_seconds, 12);
        assert_eq!(extracted.clip_count, 3);
    }

    #[test]
    fn test_patterns_defaults() {
        let extracted = extract_patterns("A glass cube on a table.");

        assert_eq!(extracted.hook_type, "Unknown");
        assert_eq!(extracted.audio_style, "Ambient_Silence");
        assert_eq!(extracted.visual_style, "Handheld_Raw");
        assert_eq!(extracted.emotion, "Trust");
        assert_eq!(extracted.duration_seconds, DEFAULT_DURATION_SECONDS);
        assert_eq!(extracted.clip_count, DEFAULT_CLIP_COUNT);
    }

    #[test]
    fn test_question_only_counts_near_the_start() {
        assert_eq!(extract_patterns("What happens next? Water pours.").hook_type, "Question");
        assert_eq!(extract_patterns("What happens next?").physics_type, "Organic_Motion");
        assert_eq!(extract_patterns("water splash").physics_type, "Fluid_Sim");

        let late = format!("{}?", "x".repeat(QUESTION_WINDOW_CHARS + 10));
        assert_eq!(extract_patterns(&late).hook_type, "Unknown");
    }

    #[test]
    fn test_llm_json_with_defaults_and_loose_numbers() {
        let extracted = ExtractedIngredients::from_llm_json(
            r#"{"hook_type": "Question", "audio_style": "SFX_Heavy", "duration_seconds": "20", "clip_count": 4.0}"#,
        )
        .unwrap();

        assert_eq!(extracted.hook_type, "Question");
        assert_eq!(extracted.visual_style, "Unknown");
        assert_eq!(extracted.physics_type, "None");
        assert_eq!(extracted.duration_seconds, 20);
        assert_eq!(extracted.clip_count, 4);

        assert!(ExtractedIngredients::from_llm_json("Sure! Here is the JSON").is_none());
        assert!(ExtractedIngredients::from_llm_json("[1, 2]").is_none());
    }

    #[test]
    fn test_apply_keeps_theme_and_formula() {
        let mut ingredients = Ingredients {
            theme: Some("loop".to_string()),
            formula: Some("loop_circular".to_string()),
            ..Ingredients::default()
        };
        extract_patterns("seamless loop, 8 sec").apply(&mut ingredients);

        assert_eq!(ingredients.theme.as_deref(), Some("loop"));
        assert_eq!(ingredients.visual_style.as_deref(), Some("Loop_Seamless"));
        assert_eq!(ingredients.duration, Some(8));
    }

    #[tokio::test]
    async fn test_offline_enricher_uses_patterns() {
        let enricher = Enricher::offline();
        assert!(!enricher.uses_llm());
        let (extracted, source) = enricher.extract("funny cat, 2 scenes").await;
        assert_eq!(source, ExtractionSource::Patterns);
        assert_eq!(extracted.emotion, "Humor");
        assert_eq!(extracted.clip_count, 2);
    }
}
