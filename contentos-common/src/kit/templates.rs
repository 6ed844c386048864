//! Formulas and the script/prompt templates used by `kit create`

use super::model::KitDocument;
use super::title_case;
use crate::files::write_atomic;
use crate::Result;
use std::fmt::Write as _;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_FORMULA: &str = "stitch_2clip";
pub const DEFAULT_THEME: &str = "loop";

/// Asset layout of a video formula
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Formula {
    pub name: &'static str,
    /// Asset directories created with the kit
    pub dirs: &'static [&'static str],
    /// Expected image files, relative to the kit folder
    pub slots: &'static [&'static str],
    /// Prompt template family looked up per theme
    pub prompt_family: &'static str,
}

impl Formula {
    /// `forward/start_frame.png` → `forward_start_frame`
    pub fn slot_name(slot: &str) -> String {
        slot.replace('/', "_").replace(".png", "")
    }

    pub fn clip_count(&self) -> usize {
        self.slots.len()
    }
}

pub const FORMULAS: [Formula; 6] = [
    Formula {
        name: "stitch_2clip",
        dirs: &["forward", "reverse"],
        slots: &[
            "forward/start_frame.png",
            "forward/end_frame.png",
            "reverse/start_frame.png",
            "reverse/end_frame.png",
        ],
        prompt_family: "stitch",
    },
    Formula {
        name: "loop_circular",
        dirs: &["loop_source"],
        slots: &["loop_source/start_frame.png", "loop_source/end_frame.png"],
        prompt_family: "circular",
    },
    Formula {
        name: "loop_boomerang",
        dirs: &["boomerang_source"],
        slots: &["boomerang_source/start_frame.png"],
        prompt_family: "boomerang",
    },
    Formula {
        name: "fpp_narrative",
        dirs: &["assets"],
        slots: &[
            "assets/clip_01.png",
            "assets/clip_02.png",
            "assets/clip_03.png",
            "assets/clip_04.png",
            "assets/clip_05.png",
            "assets/clip_06.png",
            "assets/clip_07.png",
            "assets/clip_08.png",
        ],
        prompt_family: "fpp_narrative",
    },
    Formula {
        name: "fpp_short",
        dirs: &["assets"],
        slots: &["assets/clip_01.png", "assets/clip_02.png", "assets/clip_03.png"],
        prompt_family: "fpp_short",
    },
    Formula {
        name: "cinematic_4shot",
        dirs: &["shot1_overhead", "shot2_action", "shot3_macro", "shot4_reveal"],
        slots: &[
            "shot1_overhead/start_frame.png",
            "shot2_action/start_frame.png",
            "shot2_action/end_frame.png",
            "shot3_macro/start_frame.png",
            "shot4_reveal/start_frame.png",
            "shot4_reveal/end_frame.png",
        ],
        prompt_family: "cinematic_montage",
    },
];

/// Exact lookup
pub fn find_formula(name: &str) -> Option<&'static Formula> {
    FORMULAS.iter().find(|f| f.name == name)
}

/// Lookup with the `stitch_2clip` fallback for unknown names
pub fn formula(name: &str) -> &'static Formula {
    find_formula(name).unwrap_or(&FORMULAS[0])
}

pub fn is_fpp(formula: &Formula) -> bool {
    formula.prompt_family.starts_with("fpp")
}

const LOOP_SCRIPT: &str = "[SCRIPT]
Stay until the end... It melts, it reforms, it never stops. The loop has no exit, and neither does your scroll. Stay until the end...

[METADATA]
TITLE: {name} Loop 🔁 #shorts
DESCRIPTION: A satisfying loop for your brain.
#satisfying #loop #relaxing
";

const CINEMATIC_SCRIPT: &str = "[VOICEOVER SCRIPT - TTS READY]
(Plain text for the TTS engine, neutral deep voice)

[COLD OPEN]
\"Hook line for {name}...\"

[BODY]
\"Context and build-up...\"

[CLIMAX]
\"The payoff line.\"
";

const VOXEL_SCRIPT: &str = "# {name} Voxel Horror Script

## [ESTABLISHING - 0:00-0:04]
A calm voxel scene. Nothing looks wrong.

## [ANOMALY - 0:04-0:12]
Something shifts. Small at first.

## [HORROR REVEAL - 0:12-0:16]
The anomaly in full view.

## [AUDIO DIRECTION]
🔊 Silence -> ambient dread -> sudden sting
";

/// Script template for a theme; unknown themes use `loop`
pub fn script_template(theme: &str) -> &'static str {
    match theme {
        "cinematic" => CINEMATIC_SCRIPT,
        "voxel" => VOXEL_SCRIPT,
        _ => LOOP_SCRIPT,
    }
}

const LOOP_STITCH: &str = "## Forward (0s -> 8s)
Macro shot, 8K.
{name} in its untouched starting state.
ONE CONTINUOUS TRANSFORMATION toward the peak state.
REALISM: micro-imperfections, organic motion blur.
NO fades. NO dissolves. Physics only.

## Reverse (8s -> 0s)
The same shot played back from peak to start.
Framing and lighting stay identical.
";

const LOOP_CIRCULAR: &str = "## Circular Loop (Single Clip)
Subject: {name}
Action: continuous cyclical motion.
Camera: STATIC.
Constraint: first frame and last frame MUST match exactly.
";

const LOOP_BOOMERANG: &str = "(BOOMERANG LOOP, PHYSICALLY REVERSIBLE)

[SETUP]
Start image: start_frame.png ({name}, pristine)
Loop: end -> start -> end, no seam.

[STYLE]
Macro, 8K, {name} on a black mirror surface, hard contrast, caustics.

[ACTION]
A continuous physical transformation, never a fade.
{name} softens and flows, then the same simulation runs backwards.

[PHYSICS]
Time-reversible. Gravity, surface tension and momentum preserved.
No volume gained or lost across the loop.

[LOOP CONSTRAINT]
The final frame is identical to the first: light, grain and geometry.
";

const LOOP_MONTAGE: &str = "(CINEMATIC MONTAGE, 4 SHOTS)

[STYLE]
Kitchen-show aesthetic. High contrast. 8K. Key light plus rim light.

[SHOT 1: OVERHEAD] (single image)
{name} ingredients laid out. Slow pan left to right.

[SHOT 2: ACTION] (start -> end)
The main process: searing, pouring or mixing. Raw state to finished state.

[SHOT 3: MACRO] (single image)
Extreme close-up on the money detail. Steam, gloss, crunch.

[SHOT 4: REVEAL] (start -> end)
The plated result, then the cut or the first bite.
";

const CINEMATIC_STITCH: &str = "## Cinematic Sequence (16s)
Wide establishing shot, graded like film.
{name} at the centre of the frame.
Lighting shifts over the sequence.
REALISM: film grain, lens breathing, natural colour.
Camera: slow dolly in with light parallax.
";

const CINEMATIC_CIRCULAR: &str = "## Cinematic Loop (Single Clip)
Subject: {name}
Action: quiet environmental motion (wind, light, water).
Camera: STATIC. First and last frame match.
";

const CINEMATIC_BOOMERANG: &str = "## Cinematic Boomerang
Subject: {name}
Action: a dramatic slow-motion reveal.
";

const CINEMATIC_MONTAGE: &str = "(CINEMATIC MONTAGE, 4 SHOTS, TEMPORALLY LOCKED)

[STABILITY]
Subject scale and lighting are locked across all shots.

[SHOT 1: OVERHEAD] input shot1_overhead/start_frame.png
{name} setup. Slow truck right, no rotation. Dust motes only.

[SHOT 2: ACTION] input shot2_action/start_frame.png
{name} process. 100mm macro, focus locked on the action point.

[SHOT 3: MACRO] input shot3_macro/start_frame.png
Money shot. Rack focus or a slow drip. Surface tension dominates.

[SHOT 4: REVEAL] input shot4_reveal/start_frame.png
{name} final state. Slow turntable, steam rising.
";

const VOXEL_STITCH: &str = "## Voxel Horror (16s)
Isometric voxel art.
{name} environment with something hidden in it.
LIGHTING: warm day -> cold night -> red warning glow.
Chunky pixels, stable geometry, no morphing.
";

const VOXEL_CIRCULAR: &str = "## Voxel Loop
Subject: {name}
Style: isometric voxel art.
Action: mechanical repetition or a glitch cycle.
";

const VOXEL_BOOMERANG: &str = "## Voxel Boomerang
Subject: {name}
Action: a structure building up and collapsing.
";

/// Beats of the first-person clip sequences: (title, visual, camera, audio)
const FPP_BEATS: [(&str, &str, &str, &str); 8] = [
    ("THE APPROACH", "Hands in frame moving toward the destination. Background in soft bokeh.", "Gimbal-smooth slow walk.", "Low drone, ambient hum, footsteps, opening line."),
    ("THE ENTRY", "Crossing a threshold, bright to dark. Hands on the door.", "Push forward, rack focus from hands to interior.", "Tension rises, room tone changes, door mechanism."),
    ("THE DETAILS", "Macro on one object. Only the subject is sharp.", "Rack focus, locked perspective.", "Minimal pulses, tactile sounds, a whisper."),
    ("THE ACTIVITY", "The place doing what it does. The view tracks the motion.", "Pan or tilt following the action.", "A rhythm starts, activity noise, a reaction."),
    ("THE INTENSITY", "The environment reacts. Chaos starts at the edges.", "Handheld shake, quick snaps.", "Crescendo, impact, panic."),
    ("THE ENCOUNTER", "Full reveal of the subject. Peak moment.", "Frozen framing, focus locked on the subject.", "Climax, signature sound, a gasp."),
    ("THE REACTION", "Retreat or fight back. Hands busy.", "Handheld slalom.", "Pursuit beat, rapid impacts, shouted lines."),
    ("THE CONCLUSION", "The aftermath. Calm or dread.", "Slow stabilized pull back.", "Fade to silence, a closing line."),
];

fn fpp_prompt(name: &str, clips: usize, stylized: bool) -> String {
    let (header, look) = if stylized {
        (
            format!("# FPP SHORT, {} CLIP SEQUENCE (STYLIZED)", clips),
            "First-person POV, stylized 3D game graphics, 9:16 vertical, 24fps.",
        )
    } else {
        (
            format!("# FPP NARRATIVE, {} CLIP SEQUENCE", clips),
            "First-person POV, 35mm lens, shallow depth of field, 9:16 vertical, 24fps.",
        )
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", header);
    let _ = writeln!(out, "# Every clip block is self-contained for one generation.\n");
    let _ = writeln!(out, "Concept: first-person story of {}.\n", name);

    let beats: Vec<_> = if clips == FPP_BEATS.len() {
        FPP_BEATS.to_vec()
    } else {
        // Short form keeps setup, encounter and conclusion
        vec![FPP_BEATS[0], FPP_BEATS[5], FPP_BEATS[7]]
    };

    for (i, (title, visual, camera, audio)) in beats.iter().take(clips).enumerate() {
        let _ = writeln!(out, "---\n");
        let _ = writeln!(out, "## CLIP {}: {}", i + 1, title);
        let _ = writeln!(out, "Source: assets/clip_{:02}.png\n", i + 1);
        let _ = writeln!(out, "```");
        let _ = writeln!(out, "{}\n", look);
        let _ = writeln!(out, "VISUAL: {} Hands visible throughout.\n", visual);
        let _ = writeln!(out, "CAMERA: {}\n", camera);
        let _ = writeln!(out, "ANTI-ARTIFACT: no texture morphing, geometry locked, no face reveals.\n");
        let _ = writeln!(out, "AUDIO: {}", audio);
        let _ = writeln!(out, "```\n");
    }
    out
}

/// Prompt for a theme and formula family, falling back to the theme's stitch prompt
pub fn render_prompt(theme: &str, family: &str, name: &str) -> String {
    let template = match (theme, family) {
        ("cinematic", "fpp_narrative") => return fpp_prompt(name, 8, false),
        ("cinematic", "fpp_short") => return fpp_prompt(name, 3, true),
        ("cinematic", "circular") => CINEMATIC_CIRCULAR,
        ("cinematic", "boomerang") => CINEMATIC_BOOMERANG,
        ("cinematic", "cinematic_montage") => CINEMATIC_MONTAGE,
        ("cinematic", _) => CINEMATIC_STITCH,
        ("voxel", "circular") => VOXEL_CIRCULAR,
        ("voxel", "boomerang") => VOXEL_BOOMERANG,
        ("voxel", _) => VOXEL_STITCH,
        (_, "circular") => LOOP_CIRCULAR,
        (_, "boomerang") => LOOP_BOOMERANG,
        (_, "cinematic_montage") => LOOP_MONTAGE,
        _ => LOOP_STITCH,
    };
    template.replace("{name}", name)
}

/// Everything needed to lay out a new kit folder
#[derive(Debug, Clone)]
pub struct KitBlueprint {
    pub id: String,
    pub name: String,
    pub theme: String,
    pub formula: String,
    /// Injected at the top of `prompt.txt`
    pub strategy: Option<String>,
    /// `YYYY-MM-DD`
    pub created: String,
}

impl KitBlueprint {
    /// Create directories, `script.txt`, `prompt.txt` and `kit.yaml`
    pub fn write(&self, kit_path: &Path) -> Result<KitDocument> {
        let formula = formula(&self.formula);
        let display_name = title_case(&self.name.replace('_', " "));

        std::fs::create_dir_all(kit_path)?;
        for dir in formula.dirs {
            std::fs::create_dir_all(kit_path.join(dir))?;
        }

        let script = script_template(&self.theme).replace("{name}", &display_name);
        write_atomic(&kit_path.join("script.txt"), script.as_bytes())?;

        let mut prompt = render_prompt(&self.theme, formula.prompt_family, &display_name);
        if let Some(strategy) = self.strategy.as_deref().filter(|s| !s.trim().is_empty()) {
            prompt = format!("## [STRATEGIC DIRECTION]\n{}\n\n{}", strategy, prompt);
        }
        write_atomic(&kit_path.join("prompt.txt"), prompt.as_bytes())?;

        let doc = KitDocument::new_draft(&self.id, &self.name, &self.created, &self.theme, &self.formula);
        doc.save(&kit_path.join("kit.yaml"))?;

        debug!(kit = %kit_path.display(), formula = formula.name, "Wrote kit files");
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_formula_fallback() {
        assert_eq!(formula("loop_boomerang").dirs, &["boomerang_source"]);
        assert_eq!(formula("does_not_exist").name, "stitch_2clip");
        assert!(find_formula("does_not_exist").is_none());
    }

    #[test]
    fn test_slot_name() {
        assert_eq!(Formula::slot_name("forward/start_frame.png"), "forward_start_frame");
        assert_eq!(Formula::slot_name("assets/clip_03.png"), "assets_clip_03");
    }

    #[test]
    fn test_script_template_fallback() {
        assert_eq!(script_template("unknown"), script_template("loop"));
        assert!(script_template("voxel").contains("Voxel Horror"));
    }

    #[test]
    fn test_prompt_lookup_by_theme_and_family() {
        assert!(render_prompt("loop", "circular", "Clock").contains("Circular Loop"));
        assert!(render_prompt("voxel", "cinematic_montage", "Clock").contains("Voxel Horror"));
        assert!(render_prompt("mystery", "boomerang", "Clock").contains("BOOMERANG"));

        let fpp = render_prompt("cinematic", "fpp_narrative", "Subway");
        assert!(fpp.contains("assets/clip_08.png"));
        let short = render_prompt("cinematic", "fpp_short", "Subway");
        assert!(short.contains("assets/clip_03.png"));
        assert!(!short.contains("clip_04"));
    }

    #[test]
    fn test_blueprint_writes_kit() {
        let temp = TempDir::new().unwrap();
        let kit_path = temp.path().join("003_melting_clock");
        let blueprint = KitBlueprint {
            id: "003".to_string(),
            name: "melting_clock".to_string(),
            theme: "loop".to_string(),
            formula: "loop_circular".to_string(),
            strategy: Some("Use a question hook.".to_string()),
            created: "2026-02-01".to_string(),
        };

        let doc = blueprint.write(&kit_path).unwrap();

        assert!(kit_path.join("loop_source").is_dir());
        let script = std::fs::read_to_string(kit_path.join("script.txt")).unwrap();
        assert!(script.contains("Melting Clock Loop"));
        let prompt = std::fs::read_to_string(kit_path.join("prompt.txt")).unwrap();
        assert!(prompt.starts_with("## [STRATEGIC DIRECTION]\nUse a question hook."));
        assert!(prompt.contains("Subject: Melting Clock"));

        let saved = KitDocument::load(&kit_path.join("kit.yaml")).unwrap().unwrap();
        assert_eq!(saved, doc);
        assert_eq!(saved.status.as_deref(), Some("draft"));
        assert_eq!(saved.formula_name(), "loop_circular");
    }
}
