use std::io::Cursor;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, warn};
use vnplayer_core::{AudioError, AudioFormat, MusicBackend, MusicTrack, SilentMusic};

/// Music output through the default `rodio` device.
///
/// Each track gets its own `Sink`; stopping drops it, so nothing queued by a
/// previous track can leak into the next one.
pub struct RodioMusic {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
}

impl RodioMusic {
    pub fn try_new() -> Result<Self, AudioError> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|err| AudioError::Output(err.to_string()))?;
        Ok(Self {
            _stream: stream,
            handle,
            sink: None,
        })
    }
}

impl MusicBackend for RodioMusic {
    fn play_loop(&mut self, track: MusicTrack) -> Result<(), AudioError> {
        let cursor = Cursor::new(track.bytes);
        let decoder = match track.format {
            AudioFormat::Mp3 => Decoder::new_mp3(cursor),
            AudioFormat::Wav => Decoder::new_wav(cursor),
        }
        .map_err(|err| AudioError::Decode {
            name: track.name.clone(),
            message: err.to_string(),
        })?;

        let sink = Sink::try_new(&self.handle).map_err(|err| AudioError::Output(err.to_string()))?;
        sink.append(decoder.convert_samples::<f32>().repeat_infinite());
        sink.play();
        debug!(track = %track.name, "looping track");
        self.sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }
}

/// Rodio output when a device is available, otherwise silence.
pub fn default_music(enabled: bool) -> Box<dyn MusicBackend> {
    if !enabled {
        return Box::new(SilentMusic);
    }
    match RodioMusic::try_new() {
        Ok(music) => Box::new(music),
        Err(err) => {
            warn!(error = %err, "audio output unavailable; continuing without sound");
            Box::new(SilentMusic)
        }
    }
}
