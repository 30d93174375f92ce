use std::path::PathBuf;

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::config::ConfigError;

pub type VnResult<T> = Result<T, VnError>;

#[derive(Debug, Error, Diagnostic)]
pub enum VnError {
    #[error("story document failed to parse: {message}")]
    #[diagnostic(code("vn.serialization"))]
    Serialization {
        message: String,
        #[source_code]
        src: String,
        #[label("here")]
        span: SourceSpan,
    },
    #[error("story document not found (tried {})", .tried.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", "))]
    #[diagnostic(
        code("vn.story_not_found"),
        help("Save the story from the editor as 'story.json' next to the player")
    )]
    StoryNotFound { tried: Vec<PathBuf> },
    #[error("io error: {0}")]
    #[diagnostic(code("vn.io"))]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}
