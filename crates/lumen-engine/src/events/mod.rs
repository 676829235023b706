//! Engine events.
//!
//! The runtime translates platform events into [`Event`]s, updates the
//! [`InputState`](crate::input::InputState) from them and then hands each one
//! to the application. Events carry a `handled` flag so layered consumers can
//! stop propagation.

mod handler;

use bitflags::bitflags;

use crate::input::{Key, MouseButton};

pub use handler::{EventCallback, EventHandler};

/// Discriminant of an [`EventKind`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum EventType {
    WindowClose,
    WindowResize,
    WindowFocus,
    WindowLostFocus,
    WindowMoved,
    KeyPressed,
    KeyReleased,
    KeyTyped,
    MouseButtonPressed,
    MouseButtonReleased,
    MouseMoved,
    MouseScrolled,
}

impl EventType {
    pub const ALL: [EventType; 12] = [
        EventType::WindowClose,
        EventType::WindowResize,
        EventType::WindowFocus,
        EventType::WindowLostFocus,
        EventType::WindowMoved,
        EventType::KeyPressed,
        EventType::KeyReleased,
        EventType::KeyTyped,
        EventType::MouseButtonPressed,
        EventType::MouseButtonReleased,
        EventType::MouseMoved,
        EventType::MouseScrolled,
    ];

    /// Category bits of events of this type.
    pub fn categories(self) -> EventCategory {
        use EventType::*;
        match self {
            WindowClose | WindowResize | WindowFocus | WindowLostFocus | WindowMoved => EventCategory::WINDOW,
            KeyPressed | KeyReleased | KeyTyped => EventCategory::INPUT | EventCategory::KEYBOARD,
            MouseMoved | MouseScrolled => EventCategory::INPUT | EventCategory::MOUSE,
            MouseButtonPressed | MouseButtonReleased => {
                EventCategory::INPUT | EventCategory::MOUSE | EventCategory::MOUSE_BUTTON
            }
        }
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

bitflags! {
    /// Categories an event belongs to. One event may be in several.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventCategory: u32 {
        const WINDOW = 1 << 0;
        const INPUT = 1 << 1;
        const KEYBOARD = 1 << 2;
        const MOUSE = 1 << 3;
        const MOUSE_BUTTON = 1 << 4;
    }
}

/// Event payload. Sizes and positions are in physical pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    WindowClose,
    WindowResize { width: u32, height: u32 },
    WindowFocus,
    WindowLostFocus,
    WindowMoved { x: i32, y: i32 },
    KeyPressed { key: Key, repeat_count: u32 },
    KeyReleased { key: Key },
    KeyTyped { ch: char },
    MouseButtonPressed { button: MouseButton },
    MouseButtonReleased { button: MouseButton },
    MouseMoved { x: f32, y: f32 },
    MouseScrolled { x_offset: f32, y_offset: f32 },
}

impl EventKind {
    pub fn event_type(&self) -> EventType {
        match self {
            EventKind::WindowClose => EventType::WindowClose,
            EventKind::WindowResize { .. } => EventType::WindowResize,
            EventKind::WindowFocus => EventType::WindowFocus,
            EventKind::WindowLostFocus => EventType::WindowLostFocus,
            EventKind::WindowMoved { .. } => EventType::WindowMoved,
            EventKind::KeyPressed { .. } => EventType::KeyPressed,
            EventKind::KeyReleased { .. } => EventType::KeyReleased,
            EventKind::KeyTyped { .. } => EventType::KeyTyped,
            EventKind::MouseButtonPressed { .. } => EventType::MouseButtonPressed,
            EventKind::MouseButtonReleased { .. } => EventType::MouseButtonReleased,
            EventKind::MouseMoved { .. } => EventType::MouseMoved,
            EventKind::MouseScrolled { .. } => EventType::MouseScrolled,
        }
    }
}

/// An event plus its handled flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    kind: EventKind,
    handled: bool,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Self { kind, handled: false }
    }

    #[inline]
    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    #[inline]
    pub fn event_type(&self) -> EventType {
        self.kind.event_type()
    }

    #[inline]
    pub fn category_flags(&self) -> EventCategory {
        self.event_type().categories()
    }

    #[inline]
    pub fn is_in_category(&self, category: EventCategory) -> bool {
        self.category_flags().intersects(category)
    }

    #[inline]
    pub fn handled(&self) -> bool {
        self.handled
    }

    pub fn handle(&mut self, handled: bool) {
        self.handled = handled;
    }
}

impl From<EventKind> for Event {
    fn from(kind: EventKind) -> Self {
        Event::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_event_carries_size_and_window_category() {
        let e = Event::new(EventKind::WindowResize { width: 800, height: 600 });
        let EventKind::WindowResize { width, height } = *e.kind() else {
            panic!("wrong kind");
        };
        assert_eq!((width, height), (800, 600));
        assert_eq!(e.category_flags(), EventCategory::WINDOW);
        assert!(e.is_in_category(EventCategory::WINDOW));
        assert!(!e.is_in_category(EventCategory::INPUT));
        assert_eq!(e.event_type(), EventType::WindowResize);
    }

    #[test]
    fn moved_and_focus_events_are_window_events() {
        for kind in [
            EventKind::WindowMoved { x: 750, y: 700 },
            EventKind::WindowFocus,
            EventKind::WindowLostFocus,
            EventKind::WindowClose,
        ] {
            let e = Event::new(kind);
            assert_eq!(e.category_flags(), EventCategory::WINDOW);
        }
    }

    #[test]
    fn key_events_are_keyboard_input() {
        let e = Event::new(EventKind::KeyPressed { key: Key::Q, repeat_count: 2 });
        assert_eq!(e.event_type(), EventType::KeyPressed);
        assert!(e.is_in_category(EventCategory::KEYBOARD));
        assert!(e.is_in_category(EventCategory::INPUT));
        assert!(!e.is_in_category(EventCategory::MOUSE));
        let EventKind::KeyPressed { repeat_count, .. } = *e.kind() else {
            panic!("wrong kind");
        };
        assert_eq!(repeat_count, 2);
    }

    #[test]
    fn mouse_button_events_carry_all_mouse_bits() {
        let e = Event::new(EventKind::MouseButtonPressed { button: MouseButton::Left });
        assert_eq!(e.category_flags().bits(), 0b11010);
        assert!(e.category_flags().contains(EventCategory::INPUT | EventCategory::MOUSE_BUTTON));

        let moved = Event::new(EventKind::MouseMoved { x: 3.0, y: 4.0 });
        assert!(moved.is_in_category(EventCategory::MOUSE));
        assert!(!moved.is_in_category(EventCategory::MOUSE_BUTTON));
    }

    #[test]
    fn handled_flag_toggles() {
        let mut e = Event::new(EventKind::MouseScrolled { x_offset: 0.0, y_offset: 1.0 });
        assert!(!e.handled());
        e.handle(true);
        assert!(e.handled());
        e.handle(false);
        assert!(!e.handled());
    }

    #[test]
    fn type_index_matches_all_order() {
        for (i, ty) in EventType::ALL.iter().enumerate() {
            assert_eq!(ty.index(), i);
        }
    }
}
