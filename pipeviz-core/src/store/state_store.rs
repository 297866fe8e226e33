use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{ReentrantMutex, RwLock};
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use super::subscriber::{Subscriber, SubscriberId};
use crate::state::{reduce, Action, ApplicationState};

type SubscriberList = SmallVec<[Arc<Subscriber>; 4]>;

/// Actions waiting to be reduced, and whether a thread is draining them.
#[derive(Default)]
struct DispatchQueue {
    pending: VecDeque<Action>,
    draining: bool,
}

struct StoreInner {
    /// The current revision. Swapped whole, never mutated in place.
    state: RwLock<Arc<ApplicationState>>,
    subscribers: RwLock<SubscriberList>,
    queue: ReentrantMutex<RefCell<DispatchQueue>>,
    revision: AtomicU64,
    torn_down: AtomicBool,
}

/// Handle to the state store. Clones share the same store.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

/// Non-owning handle, for components that must not keep the store alive.
#[derive(Clone)]
pub struct WeakStore {
    inner: Weak<StoreInner>,
}

impl WeakStore {
    pub fn upgrade(&self) -> Option<Store> {
        self.inner.upgrade().map(|inner| Store { inner })
    }
}

/// Resets the drain flag even if a subscriber panics.
struct DrainGuard<'a> {
    queue: &'a RefCell<DispatchQueue>,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        let mut queue = self.queue.borrow_mut();
        queue.draining = false;
        queue.pending.clear();
    }
}

impl Store {
    /// Create a store holding `initial` as revision 0.
    pub fn create(initial: ApplicationState) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(Arc::new(initial)),
                subscribers: RwLock::new(SmallVec::new()),
                queue: ReentrantMutex::new(RefCell::new(DispatchQueue::default())),
                revision: AtomicU64::new(0),
                torn_down: AtomicBool::new(false),
            }),
        }
    }

    /// The current revision of the state.
    pub fn get_state(&self) -> Arc<ApplicationState> {
        Arc::clone(&*self.inner.state.read())
    }

    /// Number of committed state changes so far.
    pub fn revision(&self) -> u64 {
        self.inner.revision.load(Ordering::SeqCst)
    }

    /// Apply an action and notify subscribers.
    ///
    /// Unknown actions leave the state unchanged but still notify.
    pub fn dispatch(&self, action: Action) {
        if self.is_torn_down() {
            debug!(action = action.kind(), "dispatch after teardown ignored");
            return;
        }

        let guard = self.inner.queue.lock();
        {
            let mut queue = guard.borrow_mut();
            queue.pending.push_back(action);
            if queue.draining {
                // A subscriber on this thread dispatched; the outer call drains.
                return;
            }
            queue.draining = true;
        }

        let _drain = DrainGuard { queue: &*guard };
        loop {
            let next = guard.borrow_mut().pending.pop_front();
            match next {
                Some(action) => self.commit(action),
                None => break,
            }
        }
    }

    fn commit(&self, action: Action) {
        let current = self.get_state();
        let state = match reduce(&current, &action) {
            Some(next) => {
                let next = Arc::new(next);
                *self.inner.state.write() = Arc::clone(&next);
                let revision = self.inner.revision.fetch_add(1, Ordering::SeqCst) + 1;
                trace!(action = action.kind(), revision, "state committed");
                next
            }
            None => {
                if matches!(action, Action::Unknown) {
                    debug!("unrecognized action passed through");
                }
                current
            }
        };
        self.notify(&state);
    }

    fn notify(&self, state: &ApplicationState) {
        // Release the lock before calling out so subscribers may
        // subscribe or unsubscribe.
        let subscribers: SubscriberList = self.inner.subscribers.read().clone();
        for subscriber in subscribers {
            subscriber.notify(state);
        }
    }

    /// Register a listener called after every dispatch.
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// dropped or the store is torn down.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ApplicationState) + Send + Sync + 'static,
    {
        let subscriber = Arc::new(Subscriber::new(listener));
        let id = subscriber.id();
        if self.is_torn_down() {
            warn!("subscribe after teardown, listener will never run");
        } else {
            self.inner.subscribers.write().push(subscriber);
        }
        Subscription {
            id,
            store: Arc::downgrade(&self.inner),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }

    pub fn downgrade(&self) -> WeakStore {
        WeakStore {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Drop all subscribers and stop accepting dispatches.
    pub fn teardown(&self) {
        if self.inner.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        let dropped = {
            let mut subscribers = self.inner.subscribers.write();
            let count = subscribers.len();
            subscribers.clear();
            count
        };
        debug!(subscribers = dropped, "store torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.torn_down.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("revision", &self.revision())
            .field("subscriber_count", &self.subscriber_count())
            .field("torn_down", &self.is_torn_down())
            .finish()
    }
}

/// Registration of a store listener.
///
/// Dropping it unsubscribes the listener.
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
    id: SubscriberId,
    store: Weak<StoreInner>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Unsubscribe now.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            inner
                .subscribers
                .write()
                .retain(|subscriber| subscriber.id() != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
