use crate::events::Event;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by binaries.
pub trait App {
    /// Called for every engine event, after the input state and the
    /// runtime's [`EventHandler`](crate::events::EventHandler) have seen it.
    ///
    /// Marking a `WindowClose` event handled keeps the window open.
    fn on_event(&mut self, event: &mut Event) -> AppControl;

    /// Called once per redraw.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
