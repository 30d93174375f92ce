use cosmic_text::Color;
use glam::{Affine2, Vec2};
use vnplayer_assets::{DecodedImage, FontFace};
use vnplayer_core::{Rect, Renderer, Rgba};

use crate::text::TextRasterizer;

/// Software [`Renderer`] over an RGBA8 frame buffer, such as the one
/// `pixels` hands out.
pub struct PixelCanvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
    text: &'a mut TextRasterizer,
}

impl<'a> PixelCanvas<'a> {
    pub fn new(frame: &'a mut [u8], width: u32, height: u32, text: &'a mut TextRasterizer) -> Self {
        Self {
            frame,
            width,
            height,
            text,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl Renderer for PixelCanvas<'_> {
    fn clear(&mut self, color: Rgba) {
        let color = color.to_array();
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        let x0 = clamp_axis(rect.x, self.width);
        let y0 = clamp_axis(rect.y, self.height);
        let x1 = clamp_axis(rect.x + rect.width, self.width);
        let y1 = clamp_axis(rect.y + rect.height, self.height);
        let color = color.to_array();
        for y in y0..y1 {
            for x in x0..x1 {
                blend(self.frame, self.width, x, y, color);
            }
        }
    }

    fn draw_image(&mut self, image: &DecodedImage, transform: Affine2) {
        if image.width == 0 || image.height == 0 {
            return;
        }
        let inverse = transform.inverse();
        if !inverse.is_finite() {
            return;
        }

        let (w, h) = (image.width as f32, image.height as f32);
        let corners = [
            transform.transform_point2(Vec2::ZERO),
            transform.transform_point2(Vec2::new(w, 0.0)),
            transform.transform_point2(Vec2::new(0.0, h)),
            transform.transform_point2(Vec2::new(w, h)),
        ];
        let min = corners.iter().fold(Vec2::splat(f32::INFINITY), |acc, c| acc.min(*c));
        let max = corners.iter().fold(Vec2::splat(f32::NEG_INFINITY), |acc, c| acc.max(*c));
        let x0 = clamp_axis(min.x.floor(), self.width);
        let y0 = clamp_axis(min.y.floor(), self.height);
        let x1 = clamp_axis(max.x.ceil(), self.width);
        let y1 = clamp_axis(max.y.ceil(), self.height);

        for y in y0..y1 {
            for x in x0..x1 {
                let source = inverse.transform_point2(Vec2::new(x as f32 + 0.5, y as f32 + 0.5));
                if source.x < 0.0 || source.y < 0.0 || source.x >= w || source.y >= h {
                    continue;
                }
                let pixel = image.pixel(source.x as u32, source.y as u32);
                blend(self.frame, self.width, x, y, pixel);
            }
        }
    }

    fn draw_text(&mut self, face: &FontFace, text: &str, x: f32, y: f32, size: f32, color: Rgba) {
        let Self {
            frame,
            width,
            height,
            text: rasterizer,
        } = self;
        let (width, height) = (*width, *height);
        let origin_x = x.round() as i32;
        let origin_y = y.round() as i32;
        let ink = Color::rgba(color.r, color.g, color.b, color.a);

        rasterizer.rasterize(face, text, size, ink, |gx, gy, gw, gh, coverage| {
            let span = [coverage.r(), coverage.g(), coverage.b(), coverage.a()];
            for dy in 0..gh as i32 {
                for dx in 0..gw as i32 {
                    let px = origin_x + gx + dx;
                    let py = origin_y + gy + dy;
                    if px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
                        continue;
                    }
                    blend(frame, width, px as u32, py as u32, span);
                }
            }
        });
    }
}

fn clamp_axis(value: f32, limit: u32) -> u32 {
    if value.is_nan() || value <= 0.0 {
        0
    } else {
        (value.round() as u32).min(limit)
    }
}

/// Source-over blend of a straight-alpha pixel onto an opaque frame.
fn blend(frame: &mut [u8], width: u32, x: u32, y: u32, src: [u8; 4]) {
    let idx = (y as usize * width as usize + x as usize) * 4;
    let Some(dst) = frame.get_mut(idx..idx + 4) else {
        return;
    };
    match src[3] {
        0 => {}
        255 => dst.copy_from_slice(&src),
        alpha => {
            let a = alpha as u32;
            for channel in 0..3 {
                let mixed = src[channel] as u32 * a + dst[channel] as u32 * (255 - a);
                dst[channel] = ((mixed + 127) / 255) as u8;
            }
            dst[3] = 255;
        }
    }
}
