//! Background music: at most one looping track at a time.

use miette::Diagnostic;
use thiserror::Error;
use tracing::{info, warn};
use vnplayer_assets::{AssetCategory, AssetError, AssetPaths};

#[derive(Debug, Error, Diagnostic)]
pub enum AudioError {
    #[error("music asset unavailable: {0}")]
    #[diagnostic(code("vn.audio.asset"))]
    Asset(#[from] AssetError),
    #[error("audio output unavailable: {0}")]
    #[diagnostic(code("vn.audio.output"))]
    Output(String),
    #[error("failed to decode '{name}': {message}")]
    #[diagnostic(code("vn.audio.decode"))]
    Decode { name: String, message: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
}

impl AudioFormat {
    /// `.mp3` selects the MP3 decoder; everything else is handed to WAV.
    pub fn from_name(name: &str) -> Self {
        if name.ends_with(".mp3") {
            AudioFormat::Mp3
        } else {
            AudioFormat::Wav
        }
    }
}

/// An encoded track ready for a backend to decode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MusicTrack {
    pub name: String,
    pub format: AudioFormat,
    pub bytes: Vec<u8>,
}

/// Output device that can loop one decoded stream forever.
pub trait MusicBackend {
    fn play_loop(&mut self, track: MusicTrack) -> Result<(), AudioError>;
    fn stop(&mut self);
}

impl<T: MusicBackend + ?Sized> MusicBackend for Box<T> {
    fn play_loop(&mut self, track: MusicTrack) -> Result<(), AudioError> {
        (**self).play_loop(track)
    }

    fn stop(&mut self) {
        (**self).stop();
    }
}

/// Backend for environments without sound output.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentMusic;

impl MusicBackend for SilentMusic {
    fn play_loop(&mut self, _track: MusicTrack) -> Result<(), AudioError> {
        Ok(())
    }

    fn stop(&mut self) {}
}

pub struct AudioLoopManager<B> {
    backend: B,
    paths: AssetPaths,
    current: Option<String>,
}

impl<B: MusicBackend> AudioLoopManager<B> {
    pub fn new(backend: B, paths: AssetPaths) -> Self {
        Self {
            backend,
            paths,
            current: None,
        }
    }

    /// Name of the track currently looping.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Switches the looping track.
    ///
    /// An empty name keeps whatever is playing, and so does the name of the
    /// current track. Failures leave silence behind and are only logged.
    pub fn set_loop(&mut self, name: &str) {
        if name.is_empty() || self.current.as_deref() == Some(name) {
            return;
        }
        self.stop();
        match self.start(name) {
            Ok(()) => {
                info!(track = name, "background music changed");
                self.current = Some(name.to_string());
            }
            Err(err) => warn!(track = name, error = %err, "background music unavailable"),
        }
    }

    pub fn stop(&mut self) {
        if self.current.take().is_some() {
            self.backend.stop();
        }
    }

    fn start(&mut self, name: &str) -> Result<(), AudioError> {
        let bytes = self.paths.read(AssetCategory::Sounds, name)?;
        self.backend.play_loop(MusicTrack {
            name: name.to_string(),
            format: AudioFormat::from_name(name),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct Calls {
        played: Vec<(String, AudioFormat)>,
        stops: usize,
    }

    #[derive(Clone, Default)]
    struct RecordingBackend {
        calls: Rc<RefCell<Calls>>,
        reject: bool,
    }

    impl MusicBackend for RecordingBackend {
        fn play_loop(&mut self, track: MusicTrack) -> Result<(), AudioError> {
            if self.reject {
                return Err(AudioError::Decode {
                    name: track.name,
                    message: "unsupported".into(),
                });
            }
            self.calls
                .borrow_mut()
                .played
                .push((track.name, track.format));
            Ok(())
        }

        fn stop(&mut self) {
            self.calls.borrow_mut().stops += 1;
        }
    }

    fn sounds_root() -> tempfile::TempDir {
        let root = tempfile::tempdir().expect("tempdir");
        let sounds = root.path().join("sounds");
        std::fs::create_dir_all(&sounds).expect("sounds dir");
        std::fs::write(sounds.join("theme.mp3"), [0u8; 4]).expect("theme");
        std::fs::write(sounds.join("rain.wav"), [0u8; 4]).expect("rain");
        root
    }

    fn manager(root: &tempfile::TempDir, backend: RecordingBackend) -> AudioLoopManager<RecordingBackend> {
        AudioLoopManager::new(backend, AssetPaths::new(root.path(), root.path()))
    }

    #[test]
    fn same_track_is_not_restarted() {
        let root = sounds_root();
        let backend = RecordingBackend::default();
        let mut audio = manager(&root, backend.clone());

        audio.set_loop("theme.mp3");
        audio.set_loop("theme.mp3");
        audio.set_loop("");

        let calls = backend.calls.borrow();
        assert_eq!(calls.played, vec![("theme.mp3".to_string(), AudioFormat::Mp3)]);
        assert_eq!(calls.stops, 0);
        assert_eq!(audio.current(), Some("theme.mp3"));
    }

    #[test]
    fn switching_tracks_stops_previous() {
        let root = sounds_root();
        let backend = RecordingBackend::default();
        let mut audio = manager(&root, backend.clone());

        audio.set_loop("theme.mp3");
        audio.set_loop("rain.wav");

        let calls = backend.calls.borrow();
        assert_eq!(calls.played.len(), 2);
        assert_eq!(calls.played[1].1, AudioFormat::Wav);
        assert_eq!(calls.stops, 1);
        assert_eq!(audio.current(), Some("rain.wav"));
    }

    #[test]
    fn missing_track_leaves_silence() {
        let root = sounds_root();
        let backend = RecordingBackend::default();
        let mut audio = manager(&root, backend.clone());

        audio.set_loop("theme.mp3");
        audio.set_loop("missing.ogg");

        assert_eq!(audio.current(), None);
        assert_eq!(backend.calls.borrow().stops, 1);

        audio.set_loop("theme.mp3");
        assert_eq!(backend.calls.borrow().played.len(), 2);
    }

    #[test]
    fn backend_rejection_is_absorbed() {
        let root = sounds_root();
        let backend = RecordingBackend {
            reject: true,
            ..RecordingBackend::default()
        };
        let mut audio = manager(&root, backend);

        audio.set_loop("rain.wav");
        assert_eq!(audio.current(), None);
    }
}
