//! Subscriber types for the store.
//!
//! A Subscriber is a listener registered with a [`Store`](super::Store). It
//! is called with the committed state after every dispatch.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::state::ApplicationState;

/// Unique identifier for a subscriber.
///
/// Used to find the listener again when its subscription is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// A listener on store updates.
pub struct Subscriber {
    id: SubscriberId,
    /// Called with the committed revision after each dispatch.
    notify: Box<dyn Fn(&ApplicationState) + Send + Sync>,
}

impl Subscriber {
    /// Create a new subscriber with the given notification callback.
    pub fn new<F>(notify: F) -> Self
    where
        F: Fn(&ApplicationState) + Send + Sync + 'static,
    {
        Self {
            id: SubscriberId::new(),
            notify: Box::new(notify),
        }
    }

    /// Get the subscriber's unique ID.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Notify the subscriber of a committed state.
    pub fn notify(&self, state: &ApplicationState) {
        (self.notify)(state);
    }
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscriber_ids_are_unique() {
        let id1 = SubscriberId::new();
        let id2 = SubscriberId::new();
        let id3 = SubscriberId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    #[test]
    fn subscriber_notify_sees_state() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let saw_labels = Arc::new(AtomicBool::new(false));
        let saw_labels_clone = saw_labels.clone();

        let subscriber = Subscriber::new(move |state| {
            saw_labels_clone.store(state.text_labels, Ordering::SeqCst);
        });

        assert!(!saw_labels.load(Ordering::SeqCst));
        subscriber.notify(&ApplicationState::default());
        assert!(saw_labels.load(Ordering::SeqCst));
    }
}
