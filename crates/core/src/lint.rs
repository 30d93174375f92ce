//! Static checks over a story document.
//!
//! The engine tolerates every issue reported here at runtime; lint exists so
//! authors find dangling jumps and dead conditions before playing.

use std::collections::HashSet;
use std::fmt;

use crate::condition::{Condition, Operator};
use crate::story::StoryDocument;

/// Severity level for lint issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LintSeverity {
    /// Content that can never be reached or shown as written.
    Error,
    /// Content that plays, but probably not the way the author meant.
    Warning,
}

/// Position of a dialogue line inside the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineRef {
    pub scene: usize,
    pub line: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LintIssue {
    pub severity: LintSeverity,
    pub message: String,
    pub at: Option<LineRef>,
}

impl LintIssue {
    fn error(message: impl Into<String>, at: Option<LineRef>) -> Self {
        Self {
            severity: LintSeverity::Error,
            message: message.into(),
            at,
        }
    }

    fn warning(message: impl Into<String>, at: Option<LineRef>) -> Self {
        Self {
            severity: LintSeverity::Warning,
            message: message.into(),
            at,
        }
    }
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            LintSeverity::Error => "error",
            LintSeverity::Warning => "warning",
        };
        match self.at {
            Some(at) => write!(f, "{level} [scene {} line {}]: {}", at.scene, at.line, self.message),
            None => write!(f, "{level}: {}", self.message),
        }
    }
}

/// Runs all checks on the document.
pub fn lint(story: &StoryDocument) -> Vec<LintIssue> {
    let mut issues = Vec::new();
    issues.extend(check_scene_ids(story));
    issues.extend(check_choice_targets(story));
    issues.extend(check_conditions(story));
    issues
}

fn check_scene_ids(story: &StoryDocument) -> Vec<LintIssue> {
    let mut seen = HashSet::new();
    let mut issues = Vec::new();
    for (index, scene) in story.scenes.iter().enumerate() {
        if scene.id.is_empty() {
            issues.push(LintIssue::warning(format!("scene #{index} has no id"), None));
        } else if !seen.insert(scene.id.as_str()) {
            issues.push(LintIssue::error(
                format!("duplicate scene id '{}' (scene #{index} is unreachable by id)", scene.id),
                None,
            ));
        }
    }
    issues
}

fn check_choice_targets(story: &StoryDocument) -> Vec<LintIssue> {
    let index = story.scene_index();
    let mut issues = Vec::new();
    for (scene_idx, scene) in story.scenes.iter().enumerate() {
        for (line_idx, dialogue) in scene.dialogues.iter().enumerate() {
            let at = Some(LineRef {
                scene: scene_idx,
                line: line_idx,
            });
            for choice in &dialogue.choices {
                if !index.contains_key(&choice.next_id) {
                    issues.push(LintIssue::error(
                        format!(
                            "choice '{}' jumps to unknown scene '{}'",
                            choice.text, choice.next_id
                        ),
                        at,
                    ));
                }
            }
        }
    }
    issues
}

fn check_conditions(story: &StoryDocument) -> Vec<LintIssue> {
    let mut issues = Vec::new();
    for (scene_idx, scene) in story.scenes.iter().enumerate() {
        for (line_idx, dialogue) in scene.dialogues.iter().enumerate() {
            if dialogue.condition.trim().is_empty() {
                continue;
            }
            let at = Some(LineRef {
                scene: scene_idx,
                line: line_idx,
            });
            let Some(condition) = Condition::parse(&dialogue.condition) else {
                issues.push(LintIssue::warning(
                    format!(
                        "condition '{}' is not 'key op value'; the line always shows",
                        dialogue.condition
                    ),
                    at,
                ));
                continue;
            };
            if Operator::parse(condition.op).is_none() {
                issues.push(LintIssue::error(
                    format!(
                        "operator '{}' is not one of >=, ==, <; the line never shows",
                        condition.op
                    ),
                    at,
                ));
            }
            if condition.value.parse::<f64>().is_err() {
                issues.push(LintIssue::error(
                    format!(
                        "'{}' is not a number; the line never shows",
                        condition.value
                    ),
                    at,
                ));
            }
        }
    }
    issues
}
