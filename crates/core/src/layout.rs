//! Screen geometry shared by the render pass and input hit-testing.

use glam::{Affine2, Vec2};

use crate::story::StoryDocument;

pub const CHOICE_WIDTH: f32 = 600.0;
pub const CHOICE_HEIGHT: f32 = 60.0;
pub const CHOICE_TOP: f32 = 300.0;
pub const CHOICE_SPACING: f32 = 70.0;
/// Sprites are scaled to this fraction of the screen height.
const SPRITE_HEIGHT_RATIO: f32 = 0.8;
/// Sprites overlap the dialogue box by this many pixels.
const SPRITE_BOX_OVERLAP: f32 = 20.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Half-open test matching the pixels a fill covers: the left column and
    /// top row are inside, the right and bottom edges are not.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StagePosition {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenLayout {
    pub width: f32,
    pub height: f32,
    pub box_height: f32,
}

impl Default for ScreenLayout {
    fn default() -> Self {
        Self::from_story(&StoryDocument::default())
    }
}

impl ScreenLayout {
    pub fn from_story(story: &StoryDocument) -> Self {
        Self {
            width: story.system.width() as f32,
            height: story.system.height() as f32,
            box_height: story.ui.box_height() as f32,
        }
    }

    /// Button rectangle for the `index`-th choice, stacked downwards and
    /// centred horizontally.
    pub fn choice_rect(&self, index: usize) -> Rect {
        Rect::new(
            (self.width - CHOICE_WIDTH) / 2.0,
            CHOICE_TOP + index as f32 * CHOICE_SPACING,
            CHOICE_WIDTH,
            CHOICE_HEIGHT,
        )
    }

    pub fn choice_at(&self, count: usize, x: f32, y: f32) -> Option<usize> {
        (0..count).find(|&index| self.choice_rect(index).contains(x, y))
    }

    /// Baseline origin of a choice label.
    pub fn choice_label_origin(&self, index: usize) -> Vec2 {
        let rect = self.choice_rect(index);
        Vec2::new(rect.x + 50.0, rect.y + 40.0)
    }

    pub fn dialogue_box(&self) -> Rect {
        Rect::new(0.0, self.height - self.box_height, self.width, self.box_height)
    }

    pub fn actor_origin(&self) -> Vec2 {
        Vec2::new(50.0, self.height - self.box_height + 50.0)
    }

    pub fn text_origin(&self) -> Vec2 {
        Vec2::new(50.0, self.height - self.box_height + 100.0)
    }

    /// Stretches an image to cover the whole screen.
    pub fn background_transform(&self, image_width: u32, image_height: u32) -> Affine2 {
        Affine2::from_scale(Vec2::new(
            self.width / image_width.max(1) as f32,
            self.height / image_height.max(1) as f32,
        ))
    }

    /// Places a sprite standing on top of the dialogue box.
    pub fn sprite_transform(
        &self,
        position: StagePosition,
        image_width: u32,
        image_height: u32,
    ) -> Affine2 {
        let scale = (self.height * SPRITE_HEIGHT_RATIO) / image_height.max(1) as f32;
        let scaled_width = image_width as f32 * scale;
        let scaled_height = image_height as f32 * scale;
        let x = match position {
            StagePosition::Left => self.width * 0.15,
            StagePosition::Center => (self.width - scaled_width) / 2.0,
            StagePosition::Right => self.width * 0.85 - scaled_width,
        };
        let y = self.height - scaled_height - (self.box_height - SPRITE_BOX_OVERLAP);
        Affine2::from_scale_angle_translation(Vec2::splat(scale), 0.0, Vec2::new(x, y))
    }
}
