use super::{Event, EventKind, EventType};

/// Callback for one event type. Returns whether the event was handled.
pub type EventCallback = Box<dyn FnMut(&EventKind) -> bool>;

/// Callback table keyed by event type.
///
/// Types without a callback are left unhandled.
pub struct EventHandler {
    callbacks: [Option<EventCallback>; EventType::ALL.len()],
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let set: Vec<EventType> = EventType::ALL
            .into_iter()
            .filter(|ty| self.callbacks[ty.index()].is_some())
            .collect();
        f.debug_struct("EventHandler").field("callbacks", &set).finish()
    }
}

impl EventHandler {
    pub fn new() -> Self {
        Self { callbacks: std::array::from_fn(|_| None) }
    }

    /// Installs `callback` for `ty`, replacing any previous one.
    pub fn set_callback<F>(&mut self, ty: EventType, callback: F)
    where
        F: FnMut(&EventKind) -> bool + 'static,
    {
        self.callbacks[ty.index()] = Some(Box::new(callback));
    }

    /// Removes the callback for `ty` and returns it.
    pub fn take_callback(&mut self, ty: EventType) -> Option<EventCallback> {
        self.callbacks[ty.index()].take()
    }

    pub fn has_callback(&self, ty: EventType) -> bool {
        self.callbacks[ty.index()].is_some()
    }

    /// Runs the callback for `event`'s type and records the result in its
    /// handled flag. Already handled events are skipped.
    pub fn dispatch(&mut self, event: &mut Event) -> bool {
        if event.handled() {
            return true;
        }
        let handled = match &mut self.callbacks[event.event_type().index()] {
            Some(callback) => callback(event.kind()),
            None => false,
        };
        event.handle(handled);
        handled
    }
}
