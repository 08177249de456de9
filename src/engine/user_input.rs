//! Input handling (winit -> engine state).
//!
//! `Windowing` stays focused on window lifecycle + rendering; `UserInput`
//! folds window events into a small per-frame `InputState` snapshot. The
//! demo is keyboard-only.

use std::collections::HashSet;

use winit::event::{ElementState, WindowEvent};
use winit::keyboard::Key;

/// Snapshot of keyboard state:
/// - `keys_down`: currently held
/// - `keys_pressed` / `keys_released`: transitions since the last frame
#[derive(Default, Debug, Clone)]
pub struct InputState {
    pub keys_down: HashSet<Key>,
    pub keys_pressed: HashSet<Key>,
    pub keys_released: HashSet<Key>,
}

impl InputState {
    /// Clears per-frame transition state; called once per frame after the
    /// game has consumed the snapshot.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
    }

    #[inline]
    pub fn key_down(&self, key: &Key) -> bool {
        self.keys_down.contains(key)
    }

    #[inline]
    pub fn key_pressed(&self, key: &Key) -> bool {
        self.keys_pressed.contains(key)
    }
}

/// Stateful input event processor.
#[derive(Default, Debug, Clone)]
pub struct UserInput {
    state: InputState,
}

impl UserInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &InputState {
        &self.state
    }

    pub fn begin_frame(&mut self) {
        self.state.begin_frame();
    }

    /// Feeds a winit event into this input handler.
    ///
    /// Returns `true` if the event was recognized as input.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                let key = event.logical_key.clone();
                match event.state {
                    ElementState::Pressed => {
                        let was_down = self.state.keys_down.contains(&key);
                        self.state.keys_down.insert(key.clone());
                        if !was_down {
                            self.state.keys_pressed.insert(key);
                        }
                    }
                    ElementState::Released => {
                        self.state.keys_down.remove(&key);
                        self.state.keys_released.insert(key);
                    }
                }
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::NamedKey;

    #[test]
    fn begin_frame_keeps_held_keys_but_clears_transitions() {
        let mut state = InputState::default();
        let key = Key::Named(NamedKey::ArrowLeft);

        state.keys_down.insert(key.clone());
        state.keys_pressed.insert(key.clone());
        assert!(state.key_down(&key));
        assert!(state.key_pressed(&key));

        state.begin_frame();
        assert!(state.key_down(&key));
        assert!(!state.key_pressed(&key));

        state.keys_down.remove(&key);
        state.keys_released.insert(key.clone());
        state.begin_frame();
        assert!(state.keys_released.is_empty());
    }
}
