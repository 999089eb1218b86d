use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::denylist::Denylist;
use crate::table::ScoreTable;

/// How the two page properties are filled from the scored images.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Best free image and best non-free image, each picked independently.
    #[default]
    Partitioned,
    /// Best free image, plus the best image overall when that one differs.
    BestOverall,
}

/// Weights used by [`crate::ImageScorer`].
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreTables {
    /// Display width of inline images.
    pub width: ScoreTable,
    /// Full width of images without a display width (galleries).
    pub gallery_image_width: ScoreTable,
    /// Aspect ratio times ten, truncated.
    pub ratio: ScoreTable,
    /// Bonus by document position; positions past the end get nothing.
    pub position: Vec<f64>,
}

impl Default for ScoreTables {
    fn default() -> Self {
        Self {
            width: ScoreTable::new([(119.0, -100.0), (400.0, 10.0), (600.0, 5.0), (601.0, 0.0)]),
            gallery_image_width: ScoreTable::new([(99.0, -100.0), (100.0, 0.0)]),
            ratio: ScoreTable::new([
                (3.0, -100.0),
                (5.0, 0.0),
                (20.0, 5.0),
                (30.0, 0.0),
                (31.0, -100.0),
            ]),
            position: vec![8.0, 6.0, 4.0, 3.0],
        }
    }
}

impl ScoreTables {
    #[must_use]
    pub fn position_bonus(&self, position: usize) -> f64 {
        self.position.get(position).copied().unwrap_or(0.0)
    }
}

#[derive(Clone, Debug)]
pub struct ScoringConfig {
    pub scores: ScoreTables,
    pub denylist: Denylist,
    /// Only look at images of the lead section.
    pub lead_section_only: bool,
    /// Namespaces whose pages get a page image.
    pub namespaces: Vec<i32>,
    pub selection: SelectionMode,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            scores: ScoreTables::default(),
            denylist: Denylist::default(),
            lead_section_only: true,
            namespaces: vec![0],
            selection: SelectionMode::default(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
struct RawConfig {
    schema_version: Option<u32>,
    lead_section_only: Option<bool>,
    namespaces: Option<Vec<i32>>,
    selection: Option<SelectionMode>,
    #[serde(default)]
    scores: Option<RawScores>,
    #[serde(default)]
    denylist: Vec<String>,
    #[serde(default)]
    denylist_files: Vec<PathBuf>,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct RawScores {
    width: Option<Value>,
    gallery_image_width: Option<Value>,
    ratio: Option<Value>,
    position: Option<Vec<f64>>,
}

impl ScoringConfig {
    /// Loads a JSON or TOML config file. Relative `denylist_files` are
    /// resolved against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_bytes_in(&bytes, path.parent())
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes_in(bytes, None)
    }

    fn from_bytes_in(bytes: &[u8], base_dir: Option<&Path>) -> Result<Self> {
        let raw = parse_raw(bytes)?;
        Self::from_raw(raw, base_dir)
    }

    fn from_raw(raw: RawConfig, base_dir: Option<&Path>) -> Result<Self> {
        if let Some(schema_version) = raw.schema_version {
            if schema_version != 1 {
                return Err(anyhow!(
                    "config.schema_version {schema_version} is not supported (expected 1)"
                ));
            }
        }

        let defaults = Self::default();
        let scores = merge_scores(raw.scores)?;

        let mut denylist = Denylist::new(&raw.denylist);
        for file in &raw.denylist_files {
            let path = match base_dir {
                Some(dir) if file.is_relative() => dir.join(file),
                _ => file.clone(),
            };
            denylist.extend_from_file(&path)?;
        }

        let namespaces = raw.namespaces.unwrap_or(defaults.namespaces);
        if namespaces.is_empty() {
            return Err(anyhow!("namespaces must list at least one namespace"));
        }

        Ok(Self {
            scores,
            denylist,
            lead_section_only: raw.lead_section_only.unwrap_or(defaults.lead_section_only),
            namespaces,
            selection: raw.selection.unwrap_or(defaults.selection),
        })
    }

    #[must_use]
    pub fn handles_namespace(&self, namespace: i32) -> bool {
        self.namespaces.contains(&namespace)
    }
}

fn merge_scores(raw: Option<RawScores>) -> Result<ScoreTables> {
    let defaults = ScoreTables::default();
    let raw = raw.unwrap_or_default();

    let table = |key: &str, value: Option<Value>, default: ScoreTable| -> Result<ScoreTable> {
        match value {
            Some(value) => {
                ScoreTable::from_value(&value).with_context(|| format!("Invalid scores.{key}"))
            }
            None => Ok(default),
        }
    };

    let position = raw.position.unwrap_or(defaults.position);
    if let Some(bad) = position.iter().find(|v| !v.is_finite()) {
        return Err(anyhow!("scores.position entries must be finite (got {bad})"));
    }

    Ok(ScoreTables {
        width: table("width", raw.width, defaults.width)?,
        gallery_image_width: table(
            "gallery_image_width",
            raw.gallery_image_width,
            defaults.gallery_image_width,
        )?,
        ratio: table("ratio", raw.ratio, defaults.ratio)?,
        position,
    })
}

fn parse_raw(bytes: &[u8]) -> Result<RawConfig> {
    let value: Value = match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(json_err) => {
            let utf8 = std::str::from_utf8(bytes).map_err(|err| anyhow!("{json_err}; {err}"))?;
            let toml_value: toml::Value = toml::from_str(utf8).map_err(|toml_err| {
                anyhow!(
                    "Config is not valid JSON or TOML ({json_err}); TOML parse error: {toml_err}"
                )
            })?;
            serde_json::to_value(toml_value)
                .map_err(|err| anyhow!("Failed to convert TOML config to JSON: {err}"))?
        }
    };

    validate_config_value(&value)?;
    serde_json::from_value(value).map_err(|err| anyhow!("Config parse error: {err}"))
}

fn validate_config_value(value: &Value) -> Result<()> {
    fn validate_object_keys(
        unknown: &mut Vec<String>,
        obj: &serde_json::Map<String, Value>,
        base: &str,
        allowed: &[&str],
    ) {
        for key in obj.keys() {
            if !allowed.iter().any(|a| a == &key.as_str()) {
                if base.is_empty() {
                    unknown.push(key.to_string());
                } else {
                    unknown.push(format!("{base}.{key}"));
                }
            }
        }
    }

    let Value::Object(root) = value else {
        return Err(anyhow!("Config must be a JSON object"));
    };

    let mut unknown = Vec::new();
    validate_object_keys(
        &mut unknown,
        root,
        "",
        &[
            "schema_version",
            "lead_section_only",
            "namespaces",
            "selection",
            "scores",
            "denylist",
            "denylist_files",
        ],
    );
    if let Some(Value::Object(scores)) = root.get("scores") {
        validate_object_keys(
            &mut unknown,
            scores,
            "scores",
            &["width", "gallery_image_width", "ratio", "position"],
        );
    }

    if unknown.is_empty() {
        Ok(())
    } else {
        Err(anyhow!("Config has unknown fields: {}", unknown.join(", ")))
    }
}
