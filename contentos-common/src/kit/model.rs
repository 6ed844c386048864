//! `kit.yaml` document model and lifecycle states
//!
//! Kits are hand-edited, so every scalar is read leniently: numbers written
//! as strings are parsed, ids written as bare integers are zero-padded, and
//! values of the wrong shape read as absent instead of failing the load.
//! Keys this model does not know are kept in `extra` and written back.

use crate::files::{read_optional, write_atomic};
use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Lifecycle state stored in `kit.yaml` `status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KitStatus {
    Draft,
    Setup,
    Pending,
    Published,
    Archived,
}

impl KitStatus {
    pub const ALL: [KitStatus; 5] = [
        KitStatus::Draft,
        KitStatus::Setup,
        KitStatus::Pending,
        KitStatus::Published,
        KitStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KitStatus::Draft => "draft",
            KitStatus::Setup => "setup",
            KitStatus::Pending => "pending",
            KitStatus::Published => "published",
            KitStatus::Archived => "archived",
        }
    }

    /// Forward moves plus restore; staying put is always allowed
    pub fn can_transition_to(self, next: KitStatus) -> bool {
        use KitStatus::*;
        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (Draft, Setup | Pending | Published)
                | (Setup, Pending | Published)
                | (Pending, Published)
                | (Published, Archived)
                | (Archived, Published)
        )
    }
}

impl fmt::Display for KitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KitStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        KitStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| Error::InvalidInput(format!("Unknown kit status '{}'", s)))
    }
}

/// Categorical ingredients plus a few numeric descriptors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ingredients {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub hook_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub audio_style: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub visual_style: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub physics_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub formula_version: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub clip_count: Option<i64>,
    #[serde(flatten)]
    pub extra: Mapping,
}

/// Platform statistics copied into the kit by `sync`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub views_24h: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub views_7d: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub views_30d: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub likes: Option<i64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub retention_avg: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<String>,
    #[serde(flatten)]
    pub extra: Mapping,
}

/// Manual ratings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ratings {
    /// Kept as written (number or text)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl Ratings {
    /// `overall` as text for storage and display
    pub fn overall_text(&self) -> Option<String> {
        self.overall.as_ref().and_then(scalar_text)
    }
}

/// Contents of a `kit.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KitDocument {
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub video_id_short: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_struct", skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Ingredients>,
    #[serde(default, deserialize_with = "lenient_struct", skip_serializing_if = "Option::is_none")]
    pub performance: Option<Performance>,
    #[serde(default, deserialize_with = "lenient_struct", skip_serializing_if = "Option::is_none")]
    pub performance_short: Option<Performance>,
    #[serde(default, deserialize_with = "lenient_struct", skip_serializing_if = "Option::is_none")]
    pub ratings: Option<Ratings>,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl KitDocument {
    /// Skeleton written by `kit create`
    pub fn new_draft(id: &str, name: &str, created: &str, theme: &str, formula: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            status: Some(KitStatus::Draft.to_string()),
            created: Some(created.to_string()),
            ingredients: Some(Ingredients {
                theme: Some(theme.to_string()),
                formula: Some(formula.to_string()),
                ..Ingredients::default()
            }),
            ..Self::default()
        }
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let value: Value = serde_yaml::from_str(text)?;
        match value {
            Value::Null => Ok(Self::default()),
            Value::Mapping(_) => Ok(serde_yaml::from_value(value)?),
            _ => Err(Error::InvalidInput("kit.yaml must be a mapping".to_string())),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Load `kit.yaml`; `None` when the file does not exist
    pub fn load(path: &Path) -> Result<Option<Self>> {
        match read_optional(path)? {
            Some(text) => Ok(Some(Self::from_yaml(&text)?)),
            None => Ok(None),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_atomic(path, self.to_yaml()?.as_bytes())
    }

    /// Parsed status, `None` when missing or not a known state
    pub fn status(&self) -> Option<KitStatus> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }

    /// Move to `next`, refusing transitions the lifecycle does not allow.
    ///
    /// Kits with a missing or unknown status may move anywhere.
    pub fn transition_to(&mut self, next: KitStatus) -> Result<()> {
        if let Some(current) = self.status() {
            if !current.can_transition_to(next) {
                return Err(Error::InvalidInput(format!(
                    "Kit cannot move from '{}' to '{}'",
                    current, next
                )));
            }
        }
        self.status = Some(next.to_string());
        Ok(())
    }

    pub fn ingredients_mut(&mut self) -> &mut Ingredients {
        self.ingredients.get_or_insert_with(Ingredients::default)
    }

    pub fn performance_mut(&mut self) -> &mut Performance {
        self.performance.get_or_insert_with(Performance::default)
    }

    pub fn performance_short_mut(&mut self) -> &mut Performance {
        self.performance_short.get_or_insert_with(Performance::default)
    }

    /// Formula name, `stitch_2clip` when unset
    pub fn formula_name(&self) -> &str {
        self.ingredients
            .as_ref()
            .and_then(|i| i.formula.as_deref())
            .unwrap_or(super::templates::DEFAULT_FORMULA)
    }

    /// True once hook type and audio style have been extracted
    pub fn is_enriched(&self) -> bool {
        self.ingredients.as_ref().is_some_and(|i| {
            i.hook_type.as_deref().is_some_and(|s| !s.is_empty())
                && i.audio_style.as_deref().is_some_and(|s| !s.is_empty())
        })
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(scalar_text))
}

fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => match n.as_u64() {
            Some(id) => Some(format!("{:03}", id)),
            None => Some(n.to_string()),
        },
        Some(other) => scalar_text(&other),
        None => None,
    })
}

fn lenient_i64<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Some(Value::String(s)) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Nested sections that are not mappings read as absent
fn lenient_struct<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(value @ Value::Mapping(_)) => serde_yaml::from_value(value).ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        use KitStatus::*;
        assert!(Draft.can_transition_to(Published));
        assert!(Setup.can_transition_to(Pending));
        assert!(Published.can_transition_to(Published));
        assert!(Published.can_transition_to(Archived));
        assert!(Archived.can_transition_to(Published));

        assert!(!Published.can_transition_to(Draft));
        assert!(!Archived.can_transition_to(Draft));
        assert!(!Pending.can_transition_to(Setup));
        assert!(!Draft.can_transition_to(Archived));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("published".parse::<KitStatus>().unwrap(), KitStatus::Published);
        assert!("shipped".parse::<KitStatus>().is_err());
    }

    #[test]
    fn test_lenient_fields() {
        let doc = KitDocument::from_yaml(
            r#"
id: 7
name: Melting Clock
status: pending
created: 2026-01-02
performance:
  views_7d: "1,250"
  likes: 40
  retention_avg: 0.62
ratings:
  overall: 8
ingredients:
  theme: loop
  duration: not-a-number
"#,
        )
        .unwrap();

        assert_eq!(doc.id.as_deref(), Some("007"));
        assert_eq!(doc.created.as_deref(), Some("2026-01-02"));
        let perf = doc.performance.as_ref().unwrap();
        assert_eq!(perf.views_7d, Some(1250));
        assert_eq!(perf.likes, Some(40));
        assert_eq!(perf.retention_avg, Some(0.62));
        assert_eq!(doc.ratings.as_ref().unwrap().overall_text().as_deref(), Some("8"));
        assert_eq!(doc.ingredients.as_ref().unwrap().duration, None);
        assert_eq!(doc.status(), Some(KitStatus::Pending));
    }

    #[test]
    fn test_unknown_keys_survive_rewrite() {
        let doc = KitDocument::from_yaml(
            r#"
id: '001'
name: glass cube
status: draft
created: '2026-01-01'
owner: sam
ingredients:
  theme: loop
  palette: neon
performance:
  views_7d: 100
  source: manual
"#,
        )
        .unwrap();

        let rewritten = KitDocument::from_yaml(&doc.to_yaml().unwrap()).unwrap();
        assert_eq!(rewritten, doc);
        assert_eq!(rewritten.extra.get("owner"), Some(&Value::from("sam")));
        assert_eq!(
            rewritten.ingredients.unwrap().extra.get("palette"),
            Some(&Value::from("neon"))
        );
    }

    #[test]
    fn test_id_string_stays_padded_after_rewrite() {
        let doc = KitDocument::new_draft("005", "x", "2026-01-01", "loop", "stitch_2clip");
        let rewritten = KitDocument::from_yaml(&doc.to_yaml().unwrap()).unwrap();
        assert_eq!(rewritten.id.as_deref(), Some("005"));
    }

    #[test]
    fn test_empty_and_non_mapping_documents() {
        assert_eq!(KitDocument::from_yaml("").unwrap(), KitDocument::default());
        assert_eq!(KitDocument::from_yaml("~\n").unwrap(), KitDocument::default());
        assert!(KitDocument::from_yaml("- a\n- b\n").is_err());
    }

    #[test]
    fn test_transition_rejects_backwards_move() {
        let mut doc = KitDocument::new_draft("001", "x", "2026-01-01", "loop", "stitch_2clip");
        doc.transition_to(KitStatus::Published).unwrap();
        doc.transition_to(KitStatus::Archived).unwrap();
        assert!(doc.transition_to(KitStatus::Draft).is_err());
        doc.transition_to(KitStatus::Published).unwrap();
        assert_eq!(doc.status(), Some(KitStatus::Published));
    }

    #[test]
    fn test_is_enriched_and_formula_default() {
        let mut doc = KitDocument::default();
        assert!(!doc.is_enriched());
        assert_eq!(doc.formula_name(), "stitch_2clip");

        doc.ingredients_mut().hook_type = Some("Question".into());
        assert!(!doc.is_enriched());
        doc.ingredients_mut().audio_style = Some("ASMR".into());
        assert!(doc.is_enriched());
    }
}
