//! Story model and playback state machine for the visual novel player.

pub mod audio;
pub mod color;
pub mod condition;
pub mod config;
mod engine;
mod error;
mod input;
pub mod layout;
pub mod lint;
pub mod render;
pub mod story;
pub mod video;

pub use audio::{AudioError, AudioFormat, AudioLoopManager, MusicBackend, MusicTrack, SilentMusic};
pub use color::{parse_hex_color, Rgba};
pub use condition::{condition_holds, Condition, Operator};
pub use config::{ConfigError, PlayerConfig, DEFAULT_CONFIG_FILE};
pub use engine::{PlaybackCursor, PlaybackEngine, PlaybackState};
pub use error::{VnError, VnResult};
pub use input::InputEvent;
pub use layout::{Rect, ScreenLayout, StagePosition};
pub use lint::{lint, LintIssue, LintSeverity};
pub use render::{DrawCommand, DrawList, Renderer};
pub use story::{Choice, Dialogue, Scene, ScreenConfig, StoryDocument, UiConfig, VarValue, Variables};
pub use video::{FrameStatus, VideoError, VideoStreamDecoder};

pub use vnplayer_assets as assets;
