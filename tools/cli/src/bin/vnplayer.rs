use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vnplayer_core::video::{self, VideoProbe};
use vnplayer_core::{
    lint, LintSeverity, MusicBackend, PlaybackEngine, PlayerConfig, StoryDocument, VnError,
    DEFAULT_CONFIG_FILE,
};
use vnplayer_runtime::{default_music, run_player};

#[derive(Parser)]
#[command(author, version, about = "Visual novel player")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Open the player window.
    Play {
        /// Player settings; a missing default file means built-in defaults.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Story file, overriding the configured lookup.
        #[arg(short, long)]
        story: Option<PathBuf>,
        /// Scene id to start from instead of the first scene.
        #[arg(long)]
        scene: Option<String>,
        #[arg(long, default_value_t = false)]
        mute: bool,
    },
    /// Parse a story file and report problems in its content.
    Validate {
        story: PathBuf,
        /// Fail on lint errors, not only on parse errors.
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Summarize a video container.
    Probe { video: PathBuf },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Play {
            config,
            story,
            scene,
            mute,
        } => play(config.as_deref(), story, scene.as_deref(), mute),
        Command::Validate { story, strict } => validate(&story, strict),
        Command::Probe { video } => probe(&video),
    }
}

fn load_config(path: Option<&Path>) -> Result<PlayerConfig> {
    let config = match path {
        Some(path) => PlayerConfig::load(path),
        None => PlayerConfig::load_or_default(Path::new(DEFAULT_CONFIG_FILE)),
    };
    config.map_err(|err| anyhow::anyhow!("{:?}", miette::Report::new(err)))
}

fn play(config: Option<&Path>, story: Option<PathBuf>, scene: Option<&str>, mute: bool) -> Result<()> {
    let mut config = load_config(config)?;
    if let Some(story) = story {
        config.story_fallback = story.clone();
        config.story = story;
    }
    if mute {
        config.audio = false;
    }

    let mut engine = open_engine(&config);
    if let Some(scene) = scene {
        if !engine.jump_to_scene(scene, Instant::now()) {
            warn!(scene, "no scene with that id; starting from the beginning");
        }
    }
    run_player(engine, &config).context("player window")?;
    Ok(())
}

/// A story that cannot be loaded is reported, and the player still opens
/// showing the placeholder.
fn open_engine(config: &PlayerConfig) -> PlaybackEngine<Box<dyn MusicBackend>> {
    match PlaybackEngine::from_story_file(config, default_music(config.audio)) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("{:?}", miette::Report::new(err));
            PlaybackEngine::empty(config.asset_paths(), default_music(config.audio), &config.font)
        }
    }
}

fn validate(path: &Path, strict: bool) -> Result<()> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let story = StoryDocument::from_json(&raw).map_err(|err: VnError| {
        anyhow::anyhow!("{:?}", miette::Report::new(err).wrap_err(format!("parse {}", path.display())))
    })?;
    let issues = lint(&story);
    print!("{}", validation_report(&story, &issues));

    let errors = issues
        .iter()
        .filter(|issue| issue.severity == LintSeverity::Error)
        .count();
    if strict && errors > 0 {
        anyhow::bail!("{errors} lint error(s) in {}", path.display());
    }
    Ok(())
}

fn validation_report(story: &StoryDocument, issues: &[vnplayer_core::LintIssue]) -> String {
    let lines: usize = story.scenes.iter().map(|scene| scene.dialogues.len()).sum();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} scene(s), {} line(s), {} variable(s)",
        story.scenes.len(),
        lines,
        story.variables.len()
    );
    for issue in issues {
        let _ = writeln!(out, "{issue}");
    }
    if issues.is_empty() {
        let _ = writeln!(out, "no issues found");
    }
    out
}

fn probe(path: &Path) -> Result<()> {
    let summary = video::probe(path).with_context(|| format!("probe {}", path.display()))?;
    print!("{}", probe_report(&summary));
    Ok(())
}

fn probe_report(summary: &VideoProbe) -> String {
    let header = &summary.header;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "signature: {}{}",
        String::from_utf8_lossy(&header.signature),
        if header.has_signature() { "" } else { " (unexpected)" }
    );
    let _ = writeln!(out, "codec: {}", String::from_utf8_lossy(&header.fourcc));
    let _ = writeln!(out, "size: {}x{}", header.width, header.height);
    let _ = writeln!(
        out,
        "rate: {}/{} ({:.3} fps, {:.2} ms per frame)",
        header.rate,
        header.scale,
        header.fps(),
        header.frame_interval().as_secs_f64() * 1000.0
    );
    let _ = writeln!(
        out,
        "frames: {} read, {} declared, {} payload bytes",
        summary.frames, header.frame_count, summary.payload_bytes
    );
    if summary.truncated {
        let _ = writeln!(out, "warning: last frame is truncated");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use vnplayer_core::video::ContainerHeader;

    #[test]
    fn probe_report_mentions_rate_and_truncation() {
        let mut raw = [0u8; video::FILE_HEADER_LEN];
        raw[..4].copy_from_slice(b"DKIF");
        raw[8..12].copy_from_slice(b"VP80");
        raw[16..20].copy_from_slice(&30u32.to_le_bytes());
        raw[20..24].copy_from_slice(&1u32.to_le_bytes());
        let summary = VideoProbe {
            header: ContainerHeader::parse(&raw),
            frames: 3,
            payload_bytes: 120,
            truncated: true,
        };

        let report = probe_report(&summary);
        assert!(report.contains("signature: DKIF\n"));
        assert!(report.contains("30/1 (30.000 fps, 33.33 ms per frame)"));
        assert!(report.contains("frames: 3 read"));
        assert!(report.contains("truncated"));
    }

    #[test]
    fn validate_accepts_clean_story_and_rejects_bad_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let good = dir.path().join("story.json");
        fs::write(
            &good,
            r#"{"scenes": [{"id": "a", "dialogues": [{"text": "hi", "choices": [{"text": "x", "nextId": "b"}]}]}]}"#,
        )
        .expect("write story");
        assert!(validate(&good, false).is_ok());
        assert!(validate(&good, true).is_err());

        let bad = dir.path().join("broken.json");
        fs::write(&bad, "{\"scenes\": [").expect("write broken");
        assert!(validate(&bad, false).is_err());
    }

    #[test]
    fn validation_report_counts_content() {
        let story = StoryDocument::from_json(
            r#"{"variables": {"gold": 1}, "scenes": [{"id": "a", "dialogues": [{"text": "hi"}]}]}"#,
        )
        .expect("parse");
        let report = validation_report(&story, &lint(&story));
        assert!(report.starts_with("1 scene(s), 1 line(s), 1 variable(s)"));
        assert!(report.contains("no issues found"));
    }

    #[test]
    fn unreadable_story_opens_the_placeholder_engine() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = PlayerConfig {
            story: dir.path().join("absent.json"),
            story_fallback: dir.path().join("also_absent.json"),
            audio: false,
            ..PlayerConfig::default()
        };
        let engine = open_engine(&config);
        assert!(engine.story().scenes.is_empty());
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(load_config(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
