//! In-memory story document as saved by the editor (`story.json`).

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::color::{parse_hex_color, Rgba};
use crate::error::{VnError, VnResult};

pub const DEFAULT_SCREEN_WIDTH: u32 = 1280;
pub const DEFAULT_SCREEN_HEIGHT: u32 = 720;
pub const DEFAULT_BOX_HEIGHT: u32 = 200;
pub const DEFAULT_FONT_SIZE: u32 = 24;
pub const DEFAULT_TITLE: &str = "RenGui Game";

/// Story variable value.
///
/// Documents may store numbers as integers or floats; comparisons only ever
/// go through [`VarValue::as_number`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VarValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl VarValue {
    /// Numeric view used by conditions. Strings, booleans and `null` count as `0`.
    pub fn as_number(&self) -> f64 {
        match self {
            VarValue::Int(value) => *value as f64,
            VarValue::Float(value) => *value,
            VarValue::Null | VarValue::Str(_) | VarValue::Bool(_) => 0.0,
        }
    }
}

impl From<i64> for VarValue {
    fn from(value: i64) -> Self {
        VarValue::Int(value)
    }
}

impl From<f64> for VarValue {
    fn from(value: f64) -> Self {
        VarValue::Float(value)
    }
}

impl From<bool> for VarValue {
    fn from(value: bool) -> Self {
        VarValue::Bool(value)
    }
}

impl From<&str> for VarValue {
    fn from(value: &str) -> Self {
        VarValue::Str(value.to_string())
    }
}

pub type Variables = HashMap<String, VarValue>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Choice {
    pub text: String,
    pub next_id: String,
}

/// One card of the script: a line of dialogue plus its staging.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Dialogue {
    #[serde(rename = "type")]
    pub kind: String,
    pub actor: String,
    pub text: String,
    pub background: String,
    pub bgm: String,
    pub sfx: String,
    pub char_left: String,
    pub char_center: String,
    pub char_right: String,
    pub condition: String,
    #[serde(deserialize_with = "null_as_default")]
    pub choices: Vec<Choice>,
    pub video: String,
}

impl Dialogue {
    pub fn has_choices(&self) -> bool {
        !self.choices.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub dialogues: Vec<Dialogue>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiConfig {
    pub box_color: String,
    pub box_opacity: f64,
    pub text_color: String,
    pub font_size: u32,
    pub box_height: Option<u32>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            box_color: "#000000".to_string(),
            box_opacity: 0.7,
            text_color: "#FFFFFF".to_string(),
            font_size: DEFAULT_FONT_SIZE,
            box_height: None,
        }
    }
}

impl UiConfig {
    pub fn box_rgba(&self) -> Rgba {
        parse_hex_color(&self.box_color, self.box_opacity)
    }

    pub fn text_rgba(&self) -> Rgba {
        parse_hex_color(&self.text_color, 1.0)
    }

    pub fn box_height(&self) -> u32 {
        match self.box_height {
            Some(height) if height > 0 => height,
            _ => DEFAULT_BOX_HEIGHT,
        }
    }

    pub fn font_size(&self) -> u32 {
        if self.font_size == 0 {
            DEFAULT_FONT_SIZE
        } else {
            self.font_size
        }
    }
}

/// Window configuration (`system` object). Zero means "use the default".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScreenConfig {
    pub title: String,
    pub screen_width: u32,
    pub screen_height: u32,
}

impl ScreenConfig {
    pub fn width(&self) -> u32 {
        if self.screen_width == 0 {
            DEFAULT_SCREEN_WIDTH
        } else {
            self.screen_width
        }
    }

    pub fn height(&self) -> u32 {
        if self.screen_height == 0 {
            DEFAULT_SCREEN_HEIGHT
        } else {
            self.screen_height
        }
    }

    pub fn title(&self) -> &str {
        if self.title.is_empty() {
            DEFAULT_TITLE
        } else {
            &self.title
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryDocument {
    pub version: i64,
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub variables: Variables,
    pub ui: UiConfig,
    pub system: ScreenConfig,
    #[serde(deserialize_with = "null_as_default")]
    pub scenes: Vec<Scene>,
}

impl StoryDocument {
    pub fn from_json(input: &str) -> VnResult<Self> {
        serde_json::from_str(input).map_err(|err| {
            let (offset, length) = json_error_span(input, &err);
            VnError::Serialization {
                message: err.to_string(),
                src: input.to_string(),
                span: (offset, length).into(),
            }
        })
    }

    /// Reads the first of `candidates` that exists and parses it.
    pub fn load_first<P: AsRef<Path>>(candidates: &[P]) -> VnResult<Self> {
        let mut tried = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let path = candidate.as_ref();
            match fs::read_to_string(path) {
                Ok(raw) => {
                    debug!(path = %path.display(), "read story document");
                    return Self::from_json(&raw);
                }
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    tried.push(PathBuf::from(path));
                }
                Err(err) => return Err(VnError::Io(err)),
            }
        }
        Err(VnError::StoryNotFound { tried })
    }

    /// Maps scene ids to their index. On duplicate ids the first scene wins.
    pub fn scene_index(&self) -> HashMap<String, usize> {
        let mut index = HashMap::with_capacity(self.scenes.len());
        for (position, scene) in self.scenes.iter().enumerate() {
            index.entry(scene.id.clone()).or_insert(position);
        }
        index
    }
}

/// The editor writes `null` for empty Go slices and maps.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn json_error_span(input: &str, error: &serde_json::Error) -> (usize, usize) {
    let line = error.line();
    let column = error.column();
    if line == 0 || column == 0 {
        return (0, 1);
    }
    let mut current_line = 1usize;
    let mut offset = 0usize;
    for chunk in input.split_inclusive('\n') {
        if current_line == line {
            let column_index = column.saturating_sub(1);
            let byte_index = chunk
                .char_indices()
                .nth(column_index)
                .map(|(idx, _)| idx)
                .unwrap_or(chunk.len().saturating_sub(1));
            offset += byte_index;
            return (offset, 1);
        }
        offset += chunk.len();
        current_line += 1;
    }
    (input.len().saturating_sub(1), 1)
}
