use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::events::EventKind;
use crate::input::{Key, MouseButton};

/// Pixels per scroll "line" when the platform reports pixel deltas.
const PIXELS_PER_LINE: f32 = 20.0;

/// Translates a winit `WindowEvent` into engine events.
///
/// A key press with text yields both `KeyPressed` and `KeyTyped`, so the
/// result is a small list. Events the engine does not model yield nothing.
pub(crate) fn translate_window_event(event: &WindowEvent) -> Vec<EventKind> {
    match event {
        WindowEvent::CloseRequested => vec![EventKind::WindowClose],

        WindowEvent::Resized(size) => vec![EventKind::WindowResize {
            width: size.width,
            height: size.height,
        }],

        WindowEvent::Moved(pos) => vec![EventKind::WindowMoved { x: pos.x, y: pos.y }],

        WindowEvent::Focused(true) => vec![EventKind::WindowFocus],
        WindowEvent::Focused(false) => vec![EventKind::WindowLostFocus],

        WindowEvent::CursorMoved { position, .. } => vec![EventKind::MouseMoved {
            x: position.x as f32,
            y: position.y as f32,
        }],

        WindowEvent::MouseInput { state, button, .. } => {
            let button = map_mouse_button(*button);
            vec![match state {
                ElementState::Pressed => EventKind::MouseButtonPressed { button },
                ElementState::Released => EventKind::MouseButtonReleased { button },
            }]
        }

        WindowEvent::MouseWheel { delta, .. } => {
            let (x_offset, y_offset) = match delta {
                MouseScrollDelta::LineDelta(x, y) => (*x, *y),
                MouseScrollDelta::PixelDelta(p) => {
                    (p.x as f32 / PIXELS_PER_LINE, p.y as f32 / PIXELS_PER_LINE)
                }
            };
            vec![EventKind::MouseScrolled { x_offset, y_offset }]
        }

        WindowEvent::KeyboardInput { event, .. } => {
            let key = map_key(event.physical_key);
            match event.state {
                ElementState::Released => vec![EventKind::KeyReleased { key }],
                ElementState::Pressed => {
                    let mut out = vec![EventKind::KeyPressed {
                        key,
                        repeat_count: u32::from(event.repeat),
                    }];
                    let typed = event
                        .text
                        .as_ref()
                        .into_iter()
                        .flat_map(|t| t.chars())
                        .filter(|c| !c.is_control())
                        .map(|ch| EventKind::KeyTyped { ch });
                    out.extend(typed);
                    out
                }
            }
        }

        _ => Vec::new(),
    }
}

pub(crate) fn map_mouse_button(b: WinitMouseButton) -> MouseButton {
    match b {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Back,
        WinitMouseButton::Forward => MouseButton::Forward,
        WinitMouseButton::Other(v) => MouseButton::Other(v),
    }
}

pub(crate) fn map_key(pk: PhysicalKey) -> Key {
    let PhysicalKey::Code(code) = pk else {
        return Key::Unknown(0);
    };

    match code {
        KeyCode::Escape => Key::Escape,
        KeyCode::Enter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Space => Key::Space,

        KeyCode::ArrowUp => Key::ArrowUp,
        KeyCode::ArrowDown => Key::ArrowDown,
        KeyCode::ArrowLeft => Key::ArrowLeft,
        KeyCode::ArrowRight => Key::ArrowRight,

        KeyCode::ShiftLeft | KeyCode::ShiftRight => Key::Shift,
        KeyCode::ControlLeft | KeyCode::ControlRight => Key::Control,
        KeyCode::AltLeft | KeyCode::AltRight => Key::Alt,

        KeyCode::KeyA => Key::A,
        KeyCode::KeyB => Key::B,
        KeyCode::KeyC => Key::C,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyE => Key::E,
        KeyCode::KeyF => Key::F,
        KeyCode::KeyG => Key::G,
        KeyCode::KeyH => Key::H,
        KeyCode::KeyI => Key::I,
        KeyCode::KeyJ => Key::J,
        KeyCode::KeyK => Key::K,
        KeyCode::KeyL => Key::L,
        KeyCode::KeyM => Key::M,
        KeyCode::KeyN => Key::N,
        KeyCode::KeyO => Key::O,
        KeyCode::KeyP => Key::P,
        KeyCode::KeyQ => Key::Q,
        KeyCode::KeyR => Key::R,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyT => Key::T,
        KeyCode::KeyU => Key::U,
        KeyCode::KeyV => Key::V,
        KeyCode::KeyW => Key::W,
        KeyCode::KeyX => Key::X,
        KeyCode::KeyY => Key::Y,
        KeyCode::KeyZ => Key::Z,

        KeyCode::Digit0 => Key::Digit0,
        KeyCode::Digit1 => Key::Digit1,
        KeyCode::Digit2 => Key::Digit2,
        KeyCode::Digit3 => Key::Digit3,
        KeyCode::Digit4 => Key::Digit4,
        KeyCode::Digit5 => Key::Digit5,
        KeyCode::Digit6 => Key::Digit6,
        KeyCode::Digit7 => Key::Digit7,
        KeyCode::Digit8 => Key::Digit8,
        KeyCode::Digit9 => Key::Digit9,

        KeyCode::F1 => Key::F1,
        KeyCode::F2 => Key::F2,
        KeyCode::F3 => Key::F3,
        KeyCode::F4 => Key::F4,
        KeyCode::F5 => Key::F5,
        KeyCode::F6 => Key::F6,
        KeyCode::F7 => Key::F7,
        KeyCode::F8 => Key::F8,
        KeyCode::F9 => Key::F9,
        KeyCode::F10 => Key::F10,
        KeyCode::F11 => Key::F11,
        KeyCode::F12 => Key::F12,

        other => Key::Unknown(other as u32),
    }
}
