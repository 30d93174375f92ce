//! Frame-by-frame playback of IVF-style video containers.
//!
//! Layout: a 32-byte file header (frame rate at bytes 16..24), then frames of
//! `[12-byte header: u32 LE payload length, u64 LE timestamp][payload]` until EOF.

use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, info, warn};
use vnplayer_assets::{FrameCodec, ImageHandle};

pub const CONTAINER_EXTENSION: &str = ".ivf";
pub const FILE_HEADER_LEN: usize = 32;
pub const FRAME_HEADER_LEN: usize = 12;
const FALLBACK_FPS: f64 = 30.0;

#[derive(Debug, Error, Diagnostic)]
pub enum VideoError {
    #[error("video io error: {0}")]
    #[diagnostic(code("vn.video.io"))]
    Io(#[from] io::Error),
    #[error("video header shorter than {FILE_HEADER_LEN} bytes")]
    #[diagnostic(code("vn.video.header"))]
    HeaderTooShort,
    #[error("frame payload truncated: expected {expected} bytes")]
    #[diagnostic(code("vn.video.truncated_frame"))]
    TruncatedFrame { expected: u32 },
}

pub fn is_container_name(name: &str) -> bool {
    name.ends_with(CONTAINER_EXTENSION)
}

/// Parsed 32-byte container header.
///
/// Only `rate` and `scale` drive playback; the other fields are kept for
/// diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContainerHeader {
    pub signature: [u8; 4],
    pub version: u16,
    pub header_len: u16,
    pub fourcc: [u8; 4],
    pub width: u16,
    pub height: u16,
    pub rate: u32,
    pub scale: u32,
    pub frame_count: u32,
}

impl ContainerHeader {
    pub fn parse(bytes: &[u8; FILE_HEADER_LEN]) -> Self {
        let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
        let u32_at =
            |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        Self {
            signature: [bytes[0], bytes[1], bytes[2], bytes[3]],
            version: u16_at(4),
            header_len: u16_at(6),
            fourcc: [bytes[8], bytes[9], bytes[10], bytes[11]],
            width: u16_at(12),
            height: u16_at(14),
            rate: u32_at(16),
            scale: u32_at(20),
            frame_count: u32_at(24),
        }
    }

    pub fn has_signature(&self) -> bool {
        &self.signature == b"DKIF"
    }

    /// Frames per second, with a zero scale read as 1 and a zero rate as 30.
    pub fn fps(&self) -> f64 {
        let scale = if self.scale == 0 { 1 } else { self.scale };
        let fps = f64::from(self.rate) / f64::from(scale);
        if fps == 0.0 {
            FALLBACK_FPS
        } else {
            fps
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    pub payload_len: u32,
    pub timestamp: u64,
}

impl FrameHeader {
    pub fn parse(bytes: &[u8; FRAME_HEADER_LEN]) -> Self {
        let mut timestamp = [0u8; 8];
        timestamp.copy_from_slice(&bytes[4..12]);
        Self {
            payload_len: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            timestamp: u64::from_le_bytes(timestamp),
        }
    }
}

/// Outcome of a single [`VideoStreamDecoder::update`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    /// Playback already finished or was stopped.
    Stopped,
    /// The frame interval has not elapsed yet.
    Waiting,
    /// A new frame replaced the displayed one.
    Decoded,
    /// The frame could not be decoded; the previous frame stays up.
    Corrupt,
    /// Clean end of stream reached on this call.
    Ended,
}

pub struct VideoStreamDecoder<C, R = BufReader<File>> {
    reader: R,
    codec: C,
    header: ContainerHeader,
    frame_interval: Duration,
    last_frame: Instant,
    current: Option<ImageHandle>,
    playing: bool,
    frames_read: u64,
}

impl<C: FrameCodec> VideoStreamDecoder<C, BufReader<File>> {
    pub fn open(path: &Path, codec: C, now: Instant) -> Result<Self, VideoError> {
        let file = File::open(path)?;
        let decoder = Self::from_reader(BufReader::new(file), codec, now)?;
        info!(
            path = %path.display(),
            fps = decoder.header.fps(),
            "opened video stream"
        );
        Ok(decoder)
    }
}

impl<C: FrameCodec, R: Read> VideoStreamDecoder<C, R> {
    /// Reads the file header; the first frame becomes due one interval after `now`.
    pub fn from_reader(mut reader: R, codec: C, now: Instant) -> Result<Self, VideoError> {
        let mut raw = [0u8; FILE_HEADER_LEN];
        reader.read_exact(&mut raw).map_err(|err| match err.kind() {
            ErrorKind::UnexpectedEof => VideoError::HeaderTooShort,
            _ => VideoError::Io(err),
        })?;
        let header = ContainerHeader::parse(&raw);
        if !header.has_signature() {
            warn!(signature = ?header.signature, "video container lacks DKIF signature");
        }
        Ok(Self {
            reader,
            codec,
            frame_interval: header.frame_interval(),
            header,
            last_frame: now,
            current: None,
            playing: true,
            frames_read: 0,
        })
    }

    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Last successfully decoded frame, if any.
    pub fn current_frame(&self) -> Option<&ImageHandle> {
        self.current.as_ref()
    }

    /// Halts playback, keeping the last frame on screen.
    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// Pulls at most one frame, and only once the frame interval has elapsed.
    pub fn update(&mut self, now: Instant) -> Result<FrameStatus, VideoError> {
        if !self.playing {
            return Ok(FrameStatus::Stopped);
        }
        if now.saturating_duration_since(self.last_frame) < self.frame_interval {
            return Ok(FrameStatus::Waiting);
        }
        self.last_frame = now;

        let mut raw = [0u8; FRAME_HEADER_LEN];
        if let Err(err) = self.reader.read_exact(&mut raw) {
            debug!(error = %err, frames = self.frames_read, "video stream finished");
            self.playing = false;
            return Ok(FrameStatus::Ended);
        }
        let frame = FrameHeader::parse(&raw);

        // Grows with the bytes actually present, never with the declared length.
        let mut payload = Vec::new();
        (&mut self.reader)
            .take(u64::from(frame.payload_len))
            .read_to_end(&mut payload)?;
        if payload.len() < frame.payload_len as usize {
            return Err(VideoError::TruncatedFrame {
                expected: frame.payload_len,
            });
        }
        self.frames_read += 1;

        match self.codec.decode_frame(&payload) {
            Ok(image) => {
                self.current = Some(Arc::new(image));
                Ok(FrameStatus::Decoded)
            }
            Err(err) => {
                debug!(error = %err, frame = self.frames_read, "keeping previous video frame");
                Ok(FrameStatus::Corrupt)
            }
        }
    }
}

/// Summary of a container file, produced by walking every frame header.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoProbe {
    pub header: ContainerHeader,
    pub frames: u64,
    pub payload_bytes: u64,
    pub truncated: bool,
}

pub fn probe(path: &Path) -> Result<VideoProbe, VideoError> {
    probe_reader(BufReader::new(File::open(path)?))
}

pub fn probe_reader<R: Read>(mut reader: R) -> Result<VideoProbe, VideoError> {
    let mut raw = [0u8; FILE_HEADER_LEN];
    reader.read_exact(&mut raw).map_err(|err| match err.kind() {
        ErrorKind::UnexpectedEof => VideoError::HeaderTooShort,
        _ => VideoError::Io(err),
    })?;
    let mut summary = VideoProbe {
        header: ContainerHeader::parse(&raw),
        frames: 0,
        payload_bytes: 0,
        truncated: false,
    };

    let mut frame_raw = [0u8; FRAME_HEADER_LEN];
    while reader.read_exact(&mut frame_raw).is_ok() {
        let frame = FrameHeader::parse(&frame_raw);
        let wanted = u64::from(frame.payload_len);
        let skipped = io::copy(&mut (&mut reader).take(wanted), &mut io::sink())?;
        if skipped < wanted {
            summary.truncated = true;
            break;
        }
        summary.frames += 1;
        summary.payload_bytes += wanted;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::Cursor;
    use vnplayer_assets::{AssetError, DecodedImage};

    /// Decodes a payload to a 1x1 image whose red channel is the first byte;
    /// payloads starting with 0xFF are treated as corrupt.
    #[derive(Default)]
    struct ScriptedCodec {
        decoded: VecDeque<u8>,
    }

    impl FrameCodec for ScriptedCodec {
        fn decode_frame(&mut self, payload: &[u8]) -> Result<DecodedImage, AssetError> {
            match payload.first() {
                Some(&0xFF) | None => Err(AssetError::Decode("corrupt".into())),
                Some(&red) => {
                    self.decoded.push_back(red);
                    Ok(DecodedImage {
                        width: 1,
                        height: 1,
                        pixels: vec![red, 0, 0, 255],
                    })
                }
            }
        }
    }

    fn header(rate: u32, scale: u32) -> Vec<u8> {
        let mut bytes = vec![0u8; FILE_HEADER_LEN];
        bytes[0..4].copy_from_slice(b"DKIF");
        bytes[8..12].copy_from_slice(b"VP80");
        bytes[16..20].copy_from_slice(&rate.to_le_bytes());
        bytes[20..24].copy_from_slice(&scale.to_le_bytes());
        bytes
    }

    fn push_frame(bytes: &mut Vec<u8>, payload: &[u8]) {
        bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&[0u8; 8]);
        bytes.extend_from_slice(payload);
    }

    fn decoder(bytes: Vec<u8>, now: Instant) -> VideoStreamDecoder<ScriptedCodec, Cursor<Vec<u8>>> {
        VideoStreamDecoder::from_reader(Cursor::new(bytes), ScriptedCodec::default(), now)
            .expect("header readable")
    }

    fn red(decoder: &VideoStreamDecoder<ScriptedCodec, Cursor<Vec<u8>>>) -> Option<u8> {
        decoder.current_frame().map(|frame| frame.pixels[0])
    }

    #[test]
    fn frame_rate_derivation() {
        let mut raw = [0u8; FILE_HEADER_LEN];
        raw.copy_from_slice(&header(30, 1));
        let parsed = ContainerHeader::parse(&raw);
        assert!(parsed.has_signature());
        assert_eq!(parsed.fps(), 30.0);
        let interval = parsed.frame_interval();
        assert!(interval > Duration::from_micros(33_300) && interval < Duration::from_micros(33_400));

        raw.copy_from_slice(&header(24, 0));
        assert_eq!(ContainerHeader::parse(&raw).fps(), 24.0);
        raw.copy_from_slice(&header(0, 1001));
        assert_eq!(ContainerHeader::parse(&raw).fps(), 30.0);
    }

    #[test]
    fn short_header_fails_to_open() {
        let result = VideoStreamDecoder::from_reader(
            Cursor::new(vec![0u8; 20]),
            ScriptedCodec::default(),
            Instant::now(),
        );
        assert!(matches!(result, Err(VideoError::HeaderTooShort)));
    }

    #[test]
    fn updates_are_rate_limited() {
        let start = Instant::now();
        let mut bytes = header(30, 1);
        push_frame(&mut bytes, &[1]);
        push_frame(&mut bytes, &[2]);
        let mut video = decoder(bytes, start);

        assert_eq!(video.update(start + Duration::from_millis(10)).unwrap(), FrameStatus::Waiting);
        assert_eq!(red(&video), None);

        let first = start + Duration::from_millis(40);
        assert_eq!(video.update(first).unwrap(), FrameStatus::Decoded);
        assert_eq!(red(&video), Some(1));

        assert_eq!(
            video.update(first + Duration::from_millis(10)).unwrap(),
            FrameStatus::Waiting
        );
        assert_eq!(red(&video), Some(1));

        assert_eq!(
            video.update(first + Duration::from_millis(34)).unwrap(),
            FrameStatus::Decoded
        );
        assert_eq!(red(&video), Some(2));
    }

    #[test]
    fn end_of_stream_is_terminal() {
        let start = Instant::now();
        let mut bytes = header(30, 1);
        push_frame(&mut bytes, &[7]);
        bytes.extend_from_slice(&[5, 0, 0]);
        let mut video = decoder(bytes, start);

        assert_eq!(video.update(start + Duration::from_millis(40)).unwrap(), FrameStatus::Decoded);
        assert_eq!(video.update(start + Duration::from_millis(80)).unwrap(), FrameStatus::Ended);
        assert!(!video.is_playing());
        assert_eq!(video.update(start + Duration::from_secs(5)).unwrap(), FrameStatus::Stopped);
        assert_eq!(red(&video), Some(7));
        assert_eq!(video.frames_read(), 1);
    }

    #[test]
    fn corrupt_frame_keeps_previous_image() {
        let start = Instant::now();
        let mut bytes = header(10, 1);
        push_frame(&mut bytes, &[3]);
        push_frame(&mut bytes, &[0xFF, 0]);
        push_frame(&mut bytes, &[4]);
        let mut video = decoder(bytes, start);

        let tick = Duration::from_millis(150);
        assert_eq!(video.update(start + tick).unwrap(), FrameStatus::Decoded);
        assert_eq!(video.update(start + tick * 2).unwrap(), FrameStatus::Corrupt);
        assert_eq!(red(&video), Some(3));
        assert!(video.is_playing());
        assert_eq!(video.update(start + tick * 3).unwrap(), FrameStatus::Decoded);
        assert_eq!(red(&video), Some(4));
        assert_eq!(video.codec.decoded, VecDeque::from(vec![3, 4]));
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let start = Instant::now();
        let mut bytes = header(30, 1);
        bytes.extend_from_slice(&10u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 8]);
        bytes.extend_from_slice(&[1, 2, 3]);
        let mut video = decoder(bytes, start);

        let err = video
            .update(start + Duration::from_millis(40))
            .expect_err("short payload must surface");
        assert!(matches!(err, VideoError::TruncatedFrame { expected: 10 }));
    }

    #[test]
    fn oversized_length_reads_only_what_the_stream_holds() {
        let start = Instant::now();
        let mut bytes = header(30, 1);
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 8]);
        bytes.extend_from_slice(&[7, 8, 9]);
        let mut video = decoder(bytes, start);

        let err = video
            .update(start + Duration::from_millis(40))
            .expect_err("declared length exceeds the stream");
        assert!(matches!(
            err,
            VideoError::TruncatedFrame {
                expected: u32::MAX
            }
        ));
        assert_eq!(video.frames_read(), 0);
        assert_eq!(red(&video), None);
    }

    #[test]
    fn probe_counts_frames_and_flags_truncation() {
        let mut bytes = header(25, 1);
        push_frame(&mut bytes, &[1, 2, 3]);
        push_frame(&mut bytes, &[4]);
        let summary = probe_reader(Cursor::new(bytes.clone())).expect("probe");
        assert_eq!(summary.frames, 2);
        assert_eq!(summary.payload_bytes, 4);
        assert!(!summary.truncated);

        bytes.extend_from_slice(&9u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 8]);
        bytes.push(1);
        let summary = probe_reader(Cursor::new(bytes)).expect("probe");
        assert_eq!(summary.frames, 2);
        assert!(summary.truncated);
    }
}
