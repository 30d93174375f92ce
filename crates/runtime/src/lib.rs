//! Desktop host for the player: a winit window blitted through `pixels`,
//! music through `rodio` and glyphs through `cosmic-text`.

pub mod audio;
pub mod canvas;
pub mod input;
pub mod text;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use pixels::{Pixels, SurfaceTexture};
use thiserror::Error;
use tracing::{info, warn};
use vnplayer_core::assets::FrameCodec;
use vnplayer_core::{InputEvent, MusicBackend, PlaybackEngine, PlayerConfig};
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

pub use self::audio::{default_music, RodioMusic};
pub use self::canvas::PixelCanvas;
pub use self::input::{InputAction, PlayerInput};
pub use self::text::TextRasterizer;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("pixel surface error: {0}")]
    Pixels(#[from] pixels::Error),
}

/// Opens the player window and runs until it is closed or Escape is pressed.
///
/// The frame buffer has the story's logical resolution; `pixels` scales it
/// to the window.
pub fn run_player<M, C>(
    mut engine: PlaybackEngine<M, C>,
    config: &PlayerConfig,
) -> Result<(), RuntimeError>
where
    M: MusicBackend + 'static,
    C: FrameCodec + Default + 'static,
{
    let layout = *engine.layout();
    let (width, height) = (layout.width as u32, layout.height as u32);
    let title = config
        .window_title
        .clone()
        .unwrap_or_else(|| engine.story().system.title().to_string());

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(title.as_str())
            .with_inner_size(LogicalSize::new(width as f64, height as f64))
            .build(&event_loop)?,
    );
    let size = window.inner_size();
    let surface = SurfaceTexture::new(size.width, size.height, window.clone());
    let mut pixels = Pixels::new(width, height, surface)?;
    info!(width, height, title = %title, "player window open");

    let mut input = PlayerInput::default();
    let mut pending: VecDeque<InputEvent> = VecDeque::new();
    let mut text = TextRasterizer::new();

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);
        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => elwt.exit(),
                WindowEvent::Resized(size) => {
                    if let Err(err) = pixels.resize_surface(size.width, size.height) {
                        warn!(error = %err, "surface resize failed");
                        elwt.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    engine.tick(Instant::now(), pending.pop_front());
                    let mut canvas = PixelCanvas::new(pixels.frame_mut(), width, height, &mut text);
                    engine.render(&mut canvas);
                    if let Err(err) = pixels.render() {
                        warn!(error = %err, "present failed");
                        elwt.exit();
                    }
                }
                other => match input.handle_window_event(&other) {
                    InputAction::None => {}
                    InputAction::Quit => elwt.exit(),
                    InputAction::Confirm => pending.push_back(InputEvent::Confirm),
                    InputAction::Choose(index) => pending.push_back(InputEvent::SelectChoice(index)),
                    InputAction::Click { x, y } => {
                        if let Ok((x, y)) = pixels.window_pos_to_pixel((x as f32, y as f32)) {
                            pending.push_back(InputEvent::Click {
                                x: x as f32,
                                y: y as f32,
                            });
                        }
                    }
                },
            },
            Event::AboutToWait => window.request_redraw(),
            _ => {}
        }
    })?;
    Ok(())
}
