//! Drawing primitives the engine issues each frame.

use glam::Affine2;
use vnplayer_assets::{DecodedImage, FontFace};

use crate::color::Rgba;
use crate::layout::Rect;

/// Target for one frame of output. Implementations own pixels; the engine
/// only describes what goes where.
pub trait Renderer {
    fn clear(&mut self, color: Rgba);
    fn fill_rect(&mut self, rect: Rect, color: Rgba);
    fn draw_image(&mut self, image: &DecodedImage, transform: Affine2);
    /// `(x, y)` is the baseline origin of the first glyph.
    fn draw_text(&mut self, face: &FontFace, text: &str, x: f32, y: f32, size: f32, color: Rgba);
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear(Rgba),
    FillRect(Rect, Rgba),
    Image {
        width: u32,
        height: u32,
        transform: Affine2,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        color: Rgba,
    },
}

/// Renderer that records commands instead of drawing them.
#[derive(Clone, Debug, Default)]
pub struct DrawList {
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn images(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| matches!(command, DrawCommand::Image { .. }))
            .count()
    }
}

impl Renderer for DrawList {
    fn clear(&mut self, color: Rgba) {
        self.commands.push(DrawCommand::Clear(color));
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        self.commands.push(DrawCommand::FillRect(rect, color));
    }

    fn draw_image(&mut self, image: &DecodedImage, transform: Affine2) {
        self.commands.push(DrawCommand::Image {
            width: image.width,
            height: image.height,
            transform,
        });
    }

    fn draw_text(&mut self, _face: &FontFace, text: &str, x: f32, y: f32, _size: f32, color: Rgba) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            x,
            y,
            color,
        });
    }
}
