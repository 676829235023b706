//! The contract between the runtime and the application.
//!
//! The runtime owns the window, GPU context, input state and clock; the
//! application sees them through [`FrameCtx`] once per frame and receives
//! every engine event through [`App::on_event`].

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
