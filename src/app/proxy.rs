//! Defines an abstraction over the event sending mechanism.

use std::sync::mpsc::Sender;

use super::events::UserEvent;

/// A trait that abstracts the sending of user events.
/// This is "fire-and-forget" and doesn't return a result, simplifying its use.
pub trait EventProxy: Clone + 'static {
    fn send_event(&self, event: UserEvent);
}

/// Channel-backed proxy, used by front ends that poll events on their own loop.
impl EventProxy for Sender<UserEvent> {
    fn send_event(&self, event: UserEvent) {
        // A dropped receiver just means nobody is listening anymore.
        if let Err(e) = self.send(event) {
            tracing::warn!("Failed to deliver event: {}", e);
        }
    }
}
