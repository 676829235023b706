//! Input subsystem.
//!
//! The public types do not expose winit. `platform::winit` translates window
//! events into engine [`Event`](crate::events::Event)s, which then feed the
//! polled [`InputState`].

pub(crate) mod platform;
mod state;
mod types;

pub use state::InputState;
pub use types::{Key, MouseButton};
