//! Push notifications from the host collection
//!
//! The host's own hook mechanism is wired up by glue code, which forwards
//! each notification to an [`EventDispatcher`]. Subscribers only see the
//! host-agnostic [`CollectionEvents`] trait.

use crate::types::{Note, NoteId};
use log::debug;
use parking_lot::RwLock;
use std::sync::Arc;

/// Host notifications that can make cached sizes stale
///
/// Every method defaults to a no-op so subscribers implement only what they
/// care about.
pub trait CollectionEvents: Send + Sync {
    /// A note was created; its entries do not exist yet
    fn on_note_added(&self, _note: &Note) {}

    /// Notes are about to be removed from the host
    fn on_notes_will_be_deleted(&self, _note_ids: &[NoteId]) {}

    fn on_media_sync_started(&self) {}

    /// Media may have changed on disk
    fn on_media_sync_finished(&self) {}
}

/// Fans host notifications out to every subscriber in registration order
#[derive(Default)]
pub struct EventDispatcher {
    subscribers: RwLock<Vec<Arc<dyn CollectionEvents>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, subscriber: Arc<dyn CollectionEvents>) {
        self.subscribers.write().push(subscriber);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn note_added(&self, note: &Note) {
        debug!("Dispatching note added: {}", note.id);
        for subscriber in self.snapshot() {
            subscriber.on_note_added(note);
        }
    }

    pub fn notes_will_be_deleted(&self, note_ids: &[NoteId]) {
        debug!("Dispatching {} note deletion(s)", note_ids.len());
        for subscriber in self.snapshot() {
            subscriber.on_notes_will_be_deleted(note_ids);
        }
    }

    pub fn media_sync_started(&self) {
        for subscriber in self.snapshot() {
            subscriber.on_media_sync_started();
        }
    }

    pub fn media_sync_finished(&self) {
        for subscriber in self.snapshot() {
            subscriber.on_media_sync_finished();
        }
    }

    // Subscribers may subscribe others while handling an event
    fn snapshot(&self) -> Vec<Arc<dyn CollectionEvents>> {
        self.subscribers.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl CollectionEvents for Recorder {
        fn on_note_added(&self, note: &Note) {
            self.events.lock().push(format!("added {}", note.id));
        }

        fn on_notes_will_be_deleted(&self, note_ids: &[NoteId]) {
            self.events
                .lock()
                .push(format!("deleting {}", note_ids.len()));
        }

        fn on_media_sync_finished(&self) {
            self.events.lock().push("synced".to_string());
        }
    }

    struct Silent;

    impl CollectionEvents for Silent {}

    #[test]
    fn test_dispatch_reaches_every_subscriber() {
        let dispatcher = EventDispatcher::new();
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        dispatcher.subscribe(first.clone());
        dispatcher.subscribe(second.clone());
        dispatcher.subscribe(Arc::new(Silent));
        assert_eq!(dispatcher.subscriber_count(), 3);

        dispatcher.note_added(&Note::new(NoteId(5), vec!["front".to_string()]));
        dispatcher.notes_will_be_deleted(&[NoteId(5), NoteId(6)]);
        dispatcher.media_sync_started();
        dispatcher.media_sync_finished();

        let expected = vec!["added 5", "deleting 2", "synced"];
        assert_eq!(*first.events.lock(), expected);
        assert_eq!(*second.events.lock(), expected);
    }

    #[test]
    fn test_dispatch_without_subscribers_is_noop() {
        let dispatcher = EventDispatcher::new();
        dispatcher.media_sync_finished();
        assert_eq!(dispatcher.subscriber_count(), 0);
    }
}
