/// Discrete player input delivered to [`crate::PlaybackEngine::tick`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    /// Primary button press at screen coordinates.
    Click { x: f32, y: f32 },
    /// Confirm key (space or enter).
    Confirm,
    /// Direct pick of a choice by index, e.g. from the digit keys.
    SelectChoice(usize),
}
