//! Player settings read from `player.toml`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vnplayer_assets::AssetPaths;

pub const DEFAULT_CONFIG_FILE: &str = "player.toml";

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("player config not found at {0}")]
    #[diagnostic(
        code(config::not_found),
        help("Omit --config to run with the built-in defaults")
    )]
    NotFound(PathBuf),

    #[error("failed to parse player config: {0}")]
    #[diagnostic(code(config::parse_error))]
    ParseError(#[from] toml::de::Error),

    #[error("io error: {0}")]
    #[diagnostic(code(config::io_error))]
    IoError(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    pub story: PathBuf,
    pub story_fallback: PathBuf,
    pub asset_root: PathBuf,
    pub asset_fallback: PathBuf,
    pub font: String,
    pub audio: bool,
    /// Overrides the document's `system.title`.
    pub window_title: Option<String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        let up_two = Path::new("..").join("..");
        Self {
            story: PathBuf::from("story.json"),
            story_fallback: up_two.join("story.json"),
            asset_root: PathBuf::from("assets"),
            asset_fallback: up_two.join("assets"),
            font: "font.ttf".to_string(),
            audio: true,
            window_title: None,
        }
    }
}

impl PlayerConfig {
    /// load a config from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
            _ => ConfigError::IoError(err),
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Like [`PlayerConfig::load`], but a missing file means defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn asset_paths(&self) -> AssetPaths {
        AssetPaths::new(&self.asset_root, &self.asset_fallback)
    }

    pub fn story_candidates(&self) -> [&Path; 2] {
        [self.story.as_path(), self.story_fallback.as_path()]
    }
}
