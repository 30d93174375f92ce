use std::sync::Arc;

use image::RgbaImage;

use crate::error::AssetError;

/// Shared handle to a decoded image. Cache hits hand out clones of the same `Arc`.
pub type ImageHandle = Arc<DecodedImage>;

/// Straight-alpha RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn from_rgba(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            pixels: image.into_raw(),
        }
    }

    /// Returns the pixel at `(x, y)`, or transparent black when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0; 4];
        }
        let idx = ((y as usize) * (self.width as usize) + x as usize) * 4;
        match self.pixels.get(idx..idx + 4) {
            Some(px) => [px[0], px[1], px[2], px[3]],
            None => [0; 4],
        }
    }
}

#[derive(Clone, Debug)]
pub struct AssetLimits {
    pub max_bytes: u64,
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for AssetLimits {
    fn default() -> Self {
        Self {
            max_bytes: 15 * 1024 * 1024,
            max_width: 4096,
            max_height: 4096,
        }
    }
}

/// Still-image decoder backed by the `image` crate (PNG and JPEG).
#[derive(Clone, Debug, Default)]
pub struct ImageDecoder {
    limits: AssetLimits,
}

impl ImageDecoder {
    pub fn with_limits(limits: AssetLimits) -> Self {
        Self { limits }
    }

    pub fn decode_bytes(&self, bytes: &[u8]) -> Result<DecodedImage, AssetError> {
        let size = bytes.len() as u64;
        if size > self.limits.max_bytes {
            return Err(AssetError::TooLarge {
                size,
                max: self.limits.max_bytes,
            });
        }
        let image =
            image::load_from_memory(bytes).map_err(|err| AssetError::Decode(err.to_string()))?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width > self.limits.max_width || height > self.limits.max_height {
            return Err(AssetError::InvalidDimensions {
                width,
                height,
                max_width: self.limits.max_width,
                max_height: self.limits.max_height,
            });
        }
        Ok(DecodedImage::from_rgba(rgba))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .expect("png encode");
        out.into_inner()
    }

    #[test]
    fn decodes_png_into_rgba() {
        let decoded = ImageDecoder::default()
            .decode_bytes(&png_bytes(3, 2))
            .expect("png should decode");
        assert_eq!((decoded.width, decoded.height), (3, 2));
        assert_eq!(decoded.pixel(2, 1), [10, 20, 30, 255]);
        assert_eq!(decoded.pixel(3, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn oversized_dimensions_are_rejected() {
        let decoder = ImageDecoder::with_limits(AssetLimits {
            max_bytes: u64::MAX,
            max_width: 2,
            max_height: 2,
        });
        let err = decoder
            .decode_bytes(&png_bytes(4, 1))
            .expect_err("limit must apply");
        assert!(matches!(err, AssetError::InvalidDimensions { width: 4, .. }));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = ImageDecoder::default()
            .decode_bytes(b"not an image")
            .expect_err("garbage must fail");
        assert!(matches!(err, AssetError::Decode(_)));
    }
}
