use image::ImageFormat;

use crate::decode::DecodedImage;
use crate::error::AssetError;

/// Single compressed video frame -> pixels.
pub trait FrameCodec {
    fn decode_frame(&mut self, payload: &[u8]) -> Result<DecodedImage, AssetError>;
}

/// VP8 keyframe decoder.
///
/// A bare VP8 frame is exactly the payload of a lossy WebP `VP8 ` chunk, so the
/// frame is wrapped in a minimal RIFF container and handed to the WebP decoder.
/// Inter frames are rejected by that decoder and surface as `Decode` errors.
#[derive(Clone, Copy, Debug, Default)]
pub struct Vp8Codec;

impl FrameCodec for Vp8Codec {
    fn decode_frame(&mut self, payload: &[u8]) -> Result<DecodedImage, AssetError> {
        let riff = wrap_vp8_frame(payload);
        let image = image::load_from_memory_with_format(&riff, ImageFormat::WebP)
            .map_err(|err| AssetError::Decode(err.to_string()))?;
        Ok(DecodedImage::from_rgba(image.to_rgba8()))
    }
}

/// Builds `RIFF <size> WEBP VP8 <len> <payload> [pad]`.
pub fn wrap_vp8_frame(payload: &[u8]) -> Vec<u8> {
    let padded = payload.len() + (payload.len() & 1);
    let riff_size = (4 + 8 + padded) as u32;

    let mut out = Vec::with_capacity(8 + riff_size as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&riff_size.to_le_bytes());
    out.extend_from_slice(b"WEBP");
    out.extend_from_slice(b"VP8 ");
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
    out
}
