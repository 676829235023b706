use std::collections::HashSet;

use glam::Vec2;

use crate::events::{Event, EventKind};

use super::types::{Key, MouseButton};

/// Polled input state for a window.
///
/// Fed with every engine [`Event`] by the runtime; camera controllers and
/// applications query it instead of tracking events themselves. Positions are
/// in physical pixels.
#[derive(Debug, Default)]
pub struct InputState {
    keys_down: HashSet<Key>,
    buttons_down: HashSet<MouseButton>,
    mouse_position: Option<Vec2>,
    frame_start_position: Option<Vec2>,
    scroll: Vec2,
    focused: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds `event` into the current state.
    pub fn apply(&mut self, event: &Event) {
        match *event.kind() {
            EventKind::KeyPressed { key, .. } => {
                self.keys_down.insert(key);
            }
            EventKind::KeyReleased { key } => {
                self.keys_down.remove(&key);
            }
            EventKind::MouseButtonPressed { button } => {
                self.buttons_down.insert(button);
            }
            EventKind::MouseButtonReleased { button } => {
                self.buttons_down.remove(&button);
            }
            EventKind::MouseMoved { x, y } => {
                let pos = Vec2::new(x, y);
                if self.frame_start_position.is_none() {
                    self.frame_start_position = self.mouse_position.or(Some(pos));
                }
                self.mouse_position = Some(pos);
            }
            EventKind::MouseScrolled { x_offset, y_offset } => {
                self.scroll += Vec2::new(x_offset, y_offset);
            }
            EventKind::WindowFocus => self.focused = true,
            EventKind::WindowLostFocus => {
                // releases are not delivered to unfocused windows
                self.focused = false;
                self.keys_down.clear();
                self.buttons_down.clear();
            }
            EventKind::WindowClose
            | EventKind::WindowResize { .. }
            | EventKind::WindowMoved { .. }
            | EventKind::KeyTyped { .. } => {}
        }
    }

    /// Resets per-frame accumulators (mouse delta, scroll).
    pub fn end_frame(&mut self) {
        self.frame_start_position = None;
        self.scroll = Vec2::ZERO;
    }

    #[inline]
    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    #[inline]
    pub fn button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    /// Last known cursor position, if the cursor has entered the window.
    pub fn mouse_position(&self) -> Option<Vec2> {
        self.mouse_position
    }

    /// Cursor movement since the last `end_frame`.
    pub fn mouse_delta(&self) -> Vec2 {
        match (self.frame_start_position, self.mouse_position) {
            (Some(start), Some(now)) => now - start,
            _ => Vec2::ZERO,
        }
    }

    /// Scroll accumulated since the last `end_frame`.
    pub fn scroll(&self) -> Vec2 {
        self.scroll
    }

    pub fn focused(&self) -> bool {
        self.focused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(state: &mut InputState, kind: EventKind) {
        state.apply(&Event::new(kind));
    }

    #[test]
    fn keys_track_press_and_release() {
        let mut s = InputState::new();
        feed(&mut s, EventKind::KeyPressed { key: Key::W, repeat_count: 0 });
        assert!(s.key_down(Key::W));
        assert!(!s.key_down(Key::S));
        feed(&mut s, EventKind::KeyReleased { key: Key::W });
        assert!(!s.key_down(Key::W));
    }

    #[test]
    fn buttons_track_press_and_release() {
        let mut s = InputState::new();
        feed(&mut s, EventKind::MouseButtonPressed { button: MouseButton::Right });
        assert!(s.button_down(MouseButton::Right));
        feed(&mut s, EventKind::MouseButtonReleased { button: MouseButton::Right });
        assert!(!s.button_down(MouseButton::Right));
    }

    #[test]
    fn focus_loss_releases_everything() {
        let mut s = InputState::new();
        feed(&mut s, EventKind::WindowFocus);
        feed(&mut s, EventKind::KeyPressed { key: Key::A, repeat_count: 0 });
        feed(&mut s, EventKind::MouseButtonPressed { button: MouseButton::Left });
        feed(&mut s, EventKind::WindowLostFocus);
        assert!(!s.focused());
        assert!(!s.key_down(Key::A));
        assert!(!s.button_down(MouseButton::Left));
    }

    #[test]
    fn mouse_delta_spans_the_frame() {
        let mut s = InputState::new();
        assert_eq!(s.mouse_position(), None);
        feed(&mut s, EventKind::MouseMoved { x: 10.0, y: 10.0 });
        s.end_frame();

        feed(&mut s, EventKind::MouseMoved { x: 12.0, y: 9.0 });
        feed(&mut s, EventKind::MouseMoved { x: 15.0, y: 7.0 });
        assert_eq!(s.mouse_position(), Some(Vec2::new(15.0, 7.0)));
        assert_eq!(s.mouse_delta(), Vec2::new(5.0, -3.0));

        s.end_frame();
        assert_eq!(s.mouse_delta(), Vec2::ZERO);
    }

    #[test]
    fn scroll_accumulates_until_end_frame() {
        let mut s = InputState::new();
        feed(&mut s, EventKind::MouseScrolled { x_offset: 0.0, y_offset: 1.0 });
        feed(&mut s, EventKind::MouseScrolled { x_offset: 0.5, y_offset: 2.0 });
        assert_eq!(s.scroll(), Vec2::new(0.5, 3.0));
        s.end_frame();
        assert_eq!(s.scroll(), Vec2::ZERO);
    }
}
