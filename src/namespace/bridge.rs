use crate::registry::{ChannelRegistry, Listener};

/// Anything that can deliver named events to a listener.
///
/// `bind_action`/`bind_event` attach to a source through this trait and
/// re-emit into the hub.
pub trait EventSource {
    fn on(&self, event: &str, listener: Listener);
}

impl EventSource for ChannelRegistry {
    fn on(&self, event: &str, listener: Listener) {
        self.subscribe(event, listener);
    }
}

impl<S: EventSource + ?Sized> EventSource for std::sync::Arc<S> {
    fn on(&self, event: &str, listener: Listener) {
        (**self).on(event, listener)
    }
}
