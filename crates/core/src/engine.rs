//! Playback engine: owns the story cursor and drives media for the current line.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};
use vnplayer_assets::{
    AssetCategory, AssetPaths, FontFace, FrameCodec, ImageHandle, ResourceCache, Vp8Codec,
};

use crate::audio::{AudioLoopManager, MusicBackend, SilentMusic};
use crate::color::Rgba;
use crate::condition::condition_holds;
use crate::config::PlayerConfig;
use crate::error::VnResult;
use crate::input::InputEvent;
use crate::layout::{ScreenLayout, StagePosition};
use crate::render::Renderer;
use crate::story::{Dialogue, StoryDocument, Variables};
use crate::video::{is_container_name, FrameStatus, VideoStreamDecoder};

const PLACEHOLDER_TEXT: &str = "No Data";
const ACTOR_COLOR: Rgba = Rgba::new(255, 255, 0, 255);
const CHOICE_FILL: Rgba = Rgba::new(255, 255, 255, 200);

/// `(scene, line)` position. `line` may sit one past the last dialogue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackCursor {
    pub scene: usize,
    pub line: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    /// No document, no scenes, or a cursor outside the scene list.
    Idle,
    AtLine {
        scene: usize,
        line: usize,
        choice_pending: bool,
    },
    SceneExhausted {
        scene: usize,
    },
}

/// Single writer of all playback state.
///
/// Call [`PlaybackEngine::tick`] and then [`PlaybackEngine::render`] once per
/// displayed frame.
pub struct PlaybackEngine<M = SilentMusic, C = Vp8Codec> {
    story: StoryDocument,
    scene_ids: HashMap<String, usize>,
    cursor: PlaybackCursor,
    images: ResourceCache,
    audio: AudioLoopManager<M>,
    video: Option<VideoStreamDecoder<C>>,
    background: Option<ImageHandle>,
    font: Option<FontFace>,
    layout: ScreenLayout,
}

impl<M: MusicBackend, C: FrameCodec + Default> PlaybackEngine<M, C> {
    /// Builds the engine and stages the first eligible line of the first scene.
    pub fn new(story: StoryDocument, paths: AssetPaths, music: M, font: &str) -> Self {
        let font = match FontFace::load(&paths, font) {
            Ok(face) => Some(face),
            Err(err) => {
                warn!(font, error = %err, "font unavailable; text will not be drawn");
                None
            }
        };
        let mut engine = Self {
            scene_ids: story.scene_index(),
            layout: ScreenLayout::from_story(&story),
            story,
            cursor: PlaybackCursor::default(),
            images: ResourceCache::new(paths.clone()),
            audio: AudioLoopManager::new(music, paths),
            video: None,
            background: None,
            font,
        };
        engine.load_state(Instant::now());
        engine
    }

    /// An engine with no document; it only ever renders the placeholder.
    pub fn empty(paths: AssetPaths, music: M, font: &str) -> Self {
        Self::new(StoryDocument::default(), paths, music, font)
    }

    /// Loads the story through the configured two-tier lookup.
    pub fn from_story_file(config: &PlayerConfig, music: M) -> VnResult<Self> {
        let story = StoryDocument::load_first(&config.story_candidates())?;
        info!(
            title = %story.title,
            scenes = story.scenes.len(),
            "story loaded"
        );
        Ok(Self::new(story, config.asset_paths(), music, &config.font))
    }

    pub fn story(&self) -> &StoryDocument {
        &self.story
    }

    pub fn variables(&self) -> &Variables {
        &self.story.variables
    }

    /// Changes take effect the next time the cursor moves.
    pub fn variables_mut(&mut self) -> &mut Variables {
        &mut self.story.variables
    }

    pub fn cursor(&self) -> PlaybackCursor {
        self.cursor
    }

    pub fn layout(&self) -> &ScreenLayout {
        &self.layout
    }

    pub fn audio(&self) -> &AudioLoopManager<M> {
        &self.audio
    }

    pub fn video(&self) -> Option<&VideoStreamDecoder<C>> {
        self.video.as_ref()
    }

    pub fn background(&self) -> Option<&ImageHandle> {
        self.background.as_ref()
    }

    pub fn font(&self) -> Option<&FontFace> {
        self.font.as_ref()
    }

    pub fn state(&self) -> PlaybackState {
        let Some(scene) = self.story.scenes.get(self.cursor.scene) else {
            return PlaybackState::Idle;
        };
        match scene.dialogues.get(self.cursor.line) {
            Some(dialogue) => PlaybackState::AtLine {
                scene: self.cursor.scene,
                line: self.cursor.line,
                choice_pending: dialogue.has_choices(),
            },
            None => PlaybackState::SceneExhausted {
                scene: self.cursor.scene,
            },
        }
    }

    pub fn current_dialogue(&self) -> Option<&Dialogue> {
        self.story
            .scenes
            .get(self.cursor.scene)?
            .dialogues
            .get(self.cursor.line)
    }

    /// Per-frame update: video first, then input.
    #[instrument(skip_all)]
    pub fn tick(&mut self, now: Instant, input: Option<InputEvent>) {
        if let Some(video) = self.video.as_mut() {
            match video.update(now) {
                Ok(FrameStatus::Ended) => info!(frames = video.frames_read(), "video ended"),
                Ok(_) => {}
                Err(err) => {
                    warn!(error = %err, "video stream broken; stopping playback");
                    video.stop();
                }
            }
        }
        if let Some(input) = input {
            self.advance(input, now);
        }
    }

    /// Applies one input to the cursor.
    ///
    /// With choices pending only a hit on a choice (or a direct pick) moves
    /// the cursor; otherwise a click or confirm steps to the next line.
    #[instrument(skip_all)]
    pub fn advance(&mut self, input: InputEvent, now: Instant) {
        let Some(dialogue) = self.current_dialogue() else {
            return;
        };

        if dialogue.has_choices() {
            let count = dialogue.choices.len();
            let picked = match input {
                InputEvent::Click { x, y } => self.layout.choice_at(count, x, y),
                InputEvent::SelectChoice(index) => (index < count).then_some(index),
                InputEvent::Confirm => None,
            };
            let Some(index) = picked else {
                return;
            };
            let target = dialogue.choices[index].next_id.clone();
            self.jump_to_scene(&target, now);
            return;
        }

        if matches!(input, InputEvent::SelectChoice(_)) {
            return;
        }
        self.cursor.line += 1;
        debug!(scene = self.cursor.scene, line = self.cursor.line, "advanced");
        if self.current_dialogue().is_some() {
            self.load_state(now);
        } else {
            info!(scene = self.cursor.scene, "scene exhausted");
        }
    }

    /// Moves to the start of scene `id`. Unknown ids leave the cursor alone.
    #[instrument(skip(self, now))]
    pub fn jump_to_scene(&mut self, id: &str, now: Instant) -> bool {
        let Some(&index) = self.scene_ids.get(id) else {
            debug!("jump target not found");
            return false;
        };
        info!(scene = index, "entering scene");
        self.cursor = PlaybackCursor {
            scene: index,
            line: 0,
        };
        self.load_state(now);
        true
    }

    pub fn restart(&mut self, now: Instant) {
        self.cursor = PlaybackCursor::default();
        self.load_state(now);
    }

    /// Skips lines whose condition fails, then stages media for the first
    /// line that passes.
    #[instrument(skip_all)]
    pub fn load_state(&mut self, now: Instant) {
        let Some(scene) = self.story.scenes.get(self.cursor.scene) else {
            return;
        };
        let mut line = self.cursor.line;
        let staged = loop {
            let Some(dialogue) = scene.dialogues.get(line) else {
                break None;
            };
            if condition_holds(&dialogue.condition, &self.story.variables) {
                break Some(dialogue);
            }
            debug!(line, condition = %dialogue.condition, "condition failed; skipping line");
            line += 1;
        };
        self.cursor.line = line;

        let Some(dialogue) = staged else {
            info!(scene = self.cursor.scene, "scene exhausted");
            return;
        };
        let bgm = dialogue.bgm.clone();
        let background = dialogue.background.clone();
        let video = dialogue.video.clone();

        self.audio.set_loop(&bgm);
        self.stage_background(&background, &video, now);
    }

    fn stage_background(&mut self, background: &str, video: &str, now: Instant) {
        let video_source = if background.is_empty() { video } else { background };
        if is_container_name(video_source) {
            if self.video.is_none() {
                self.video = self.open_video_or_none(video_source, now);
            }
            self.background = None;
        } else if !background.is_empty() {
            if self.video.take().is_some() {
                info!("video stream closed");
            }
            self.background = self.load_image_or_none(AssetCategory::Images, background);
        }
    }

    /// Opens a video from the images directory, or logs why it cannot.
    pub fn open_video_or_none(&self, name: &str, now: Instant) -> Option<VideoStreamDecoder<C>> {
        let (file, path) = match self.images.paths().open(AssetCategory::Images, name) {
            Ok(opened) => opened,
            Err(err) => {
                warn!(video = name, error = %err, "video unavailable");
                return None;
            }
        };
        match VideoStreamDecoder::from_reader(BufReader::<File>::new(file), C::default(), now) {
            Ok(decoder) => {
                info!(path = %path.display(), fps = decoder.header().fps(), "video opened");
                Some(decoder)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "video unreadable");
                None
            }
        }
    }

    /// Cached image, or `None` when it cannot be loaded.
    pub fn load_image_or_none(&mut self, category: AssetCategory, name: &str) -> Option<ImageHandle> {
        self.images.load_or_none(category, name)
    }

    /// Draws the current frame: background, sprites, then choices or the
    /// dialogue box.
    pub fn render<R: Renderer>(&mut self, renderer: &mut R) {
        let size = self.story.ui.font_size() as f32;
        renderer.clear(Rgba::BLACK);

        if self.story.scenes.is_empty() {
            if let Some(font) = &self.font {
                renderer.draw_text(font, PLACEHOLDER_TEXT, 50.0, 50.0, size, Rgba::WHITE);
            }
            return;
        }

        let frame = self
            .video
            .as_ref()
            .and_then(|video| video.current_frame())
            .or(self.background.as_ref());
        if let Some(image) = frame {
            renderer.draw_image(image, self.layout.background_transform(image.width, image.height));
        }

        let Some(dialogue) = self
            .story
            .scenes
            .get(self.cursor.scene)
            .and_then(|scene| scene.dialogues.get(self.cursor.line))
        else {
            return;
        };

        let sprites = [
            (&dialogue.char_center, StagePosition::Center),
            (&dialogue.char_left, StagePosition::Left),
            (&dialogue.char_right, StagePosition::Right),
        ];
        for (name, position) in sprites {
            if name.is_empty() {
                continue;
            }
            if let Some(sprite) = self.images.load_or_none(AssetCategory::Sprites, name) {
                let transform = self.layout.sprite_transform(position, sprite.width, sprite.height);
                renderer.draw_image(&sprite, transform);
            }
        }

        if dialogue.has_choices() {
            for (index, choice) in dialogue.choices.iter().enumerate() {
                renderer.fill_rect(self.layout.choice_rect(index), CHOICE_FILL);
                if let Some(font) = &self.font {
                    let origin = self.layout.choice_label_origin(index);
                    renderer.draw_text(font, &choice.text, origin.x, origin.y, size, Rgba::BLACK);
                }
            }
            return;
        }

        renderer.fill_rect(self.layout.dialogue_box(), self.story.ui.box_rgba());
        if let Some(font) = &self.font {
            if !dialogue.actor.is_empty() {
                let origin = self.layout.actor_origin();
                renderer.draw_text(font, &dialogue.actor, origin.x, origin.y, size, ACTOR_COLOR);
            }
            let origin = self.layout.text_origin();
            renderer.draw_text(
                font,
                &dialogue.text,
                origin.x,
                origin.y,
                size,
                self.story.ui.text_rgba(),
            );
        }
    }
}
