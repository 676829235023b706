//! Window + runtime loop.
//!
//! Owns the `winit` event loop and the single application window, and wires
//! them to the GPU context, the input state and the app.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
pub use winit::window::CursorIcon;
