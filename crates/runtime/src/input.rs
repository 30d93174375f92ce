use std::collections::HashMap;

use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// What a window event means to the player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputAction {
    None,
    Confirm,
    Choose(usize),
    /// Primary click at a physical window position, not yet mapped to the
    /// frame buffer.
    Click { x: f64, y: f64 },
    Quit,
}

/// Maps keys through a table and tracks the pointer for clicks.
#[derive(Clone, Debug)]
pub struct PlayerInput {
    key_map: HashMap<KeyCode, InputAction>,
    cursor: Option<(f64, f64)>,
}

impl PlayerInput {
    pub fn new(key_map: HashMap<KeyCode, InputAction>) -> Self {
        Self {
            key_map,
            cursor: None,
        }
    }

    pub fn action_for_key(&self, key: KeyCode) -> InputAction {
        self.key_map.get(&key).copied().unwrap_or(InputAction::None)
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) -> InputAction {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some((position.x, position.y));
                InputAction::None
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                InputAction::None
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => match self.cursor {
                Some((x, y)) => InputAction::Click { x, y },
                None => InputAction::None,
            },
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed && !event.repeat =>
            {
                match event.physical_key {
                    PhysicalKey::Code(key) => self.action_for_key(key),
                    PhysicalKey::Unidentified(_) => InputAction::None,
                }
            }
            _ => InputAction::None,
        }
    }
}

impl Default for PlayerInput {
    fn default() -> Self {
        let mut map = HashMap::new();
        map.insert(KeyCode::Space, InputAction::Confirm);
        map.insert(KeyCode::Enter, InputAction::Confirm);
        map.insert(KeyCode::Escape, InputAction::Quit);

        let digits = [
            KeyCode::Digit1,
            KeyCode::Digit2,
            KeyCode::Digit3,
            KeyCode::Digit4,
            KeyCode::Digit5,
            KeyCode::Digit6,
            KeyCode::Digit7,
            KeyCode::Digit8,
            KeyCode::Digit9,
        ];
        for (index, key) in digits.into_iter().enumerate() {
            map.insert(key, InputAction::Choose(index));
        }

        Self::new(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings() {
        let input = PlayerInput::default();
        assert_eq!(input.action_for_key(KeyCode::Space), InputAction::Confirm);
        assert_eq!(input.action_for_key(KeyCode::Enter), InputAction::Confirm);
        assert_eq!(input.action_for_key(KeyCode::Digit1), InputAction::Choose(0));
        assert_eq!(input.action_for_key(KeyCode::Digit9), InputAction::Choose(8));
        assert_eq!(input.action_for_key(KeyCode::Escape), InputAction::Quit);
        assert_eq!(input.action_for_key(KeyCode::KeyA), InputAction::None);
    }

    #[test]
    fn custom_table_replaces_defaults() {
        let mut map = HashMap::new();
        map.insert(KeyCode::KeyZ, InputAction::Confirm);
        let input = PlayerInput::new(map);
        assert_eq!(input.action_for_key(KeyCode::KeyZ), InputAction::Confirm);
        assert_eq!(input.action_for_key(KeyCode::Space), InputAction::None);
    }
}
