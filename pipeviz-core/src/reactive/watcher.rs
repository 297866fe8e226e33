//! Change Watcher
//!
//! A ChangeWatcher runs a selector over each new state and reports whether
//! the selected value differs from the one it saw last.
//!
//! # How Watchers Work
//!
//! 1. The watcher starts [`WatchState::Unset`], so the first observation is
//!    always a change.
//!
//! 2. Each observation recomputes the selected value from scratch.
//!
//! 3. The new value is compared to the remembered one with `PartialEq`.
//!    Selected values are fresh on every call, so only value equality is
//!    meaningful here.
//!
//! 4. On a difference the new value replaces the remembered one and is
//!    returned to the caller. The watcher never dispatches anything itself.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::state::ApplicationState;

/// Whether a watcher has observed anything yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Nothing observed. The next observation is a change.
    Unset,

    /// A value is remembered.
    Observed,
}

/// Outcome of a single observation.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation<T> {
    /// The selected value differs from the previous one.
    Changed(T),

    /// The selected value is equal to the previous one.
    Unchanged,
}

impl<T> Observation<T> {
    pub fn is_changed(&self) -> bool {
        matches!(self, Observation::Changed(_))
    }
}

/// Remembers the last selected value and detects changes to it.
pub struct ChangeWatcher<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    select: Box<dyn Fn(&ApplicationState) -> T + Send + Sync>,

    /// Last selected value; `None` is the unset sentinel.
    last: Mutex<Option<T>>,

    changes: AtomicU64,
    observations: AtomicU64,
}

impl<T> ChangeWatcher<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    /// Create a watcher over `select`. Nothing runs until the first
    /// observation.
    pub fn new<F>(select: F) -> Self
    where
        F: Fn(&ApplicationState) -> T + Send + Sync + 'static,
    {
        Self {
            select: Box::new(select),
            last: Mutex::new(None),
            changes: AtomicU64::new(0),
            observations: AtomicU64::new(0),
        }
    }

    /// Select from `state` and compare with the remembered value.
    pub fn observe(&self, state: &ApplicationState) -> Observation<T> {
        let next = (self.select)(state);
        self.observations.fetch_add(1, Ordering::Relaxed);

        let mut last = self.last.lock();
        if last.as_ref() == Some(&next) {
            return Observation::Unchanged;
        }
        *last = Some(next.clone());
        self.changes.fetch_add(1, Ordering::Relaxed);
        Observation::Changed(next)
    }

    /// Forget the remembered value so the next observation is a change.
    pub fn reset(&self) {
        *self.last.lock() = None;
    }

    pub fn state(&self) -> WatchState {
        if self.last.lock().is_some() {
            WatchState::Observed
        } else {
            WatchState::Unset
        }
    }

    /// The remembered value, if any.
    pub fn last(&self) -> Option<T> {
        self.last.lock().clone()
    }

    /// Number of observations reported as changes.
    pub fn change_count(&self) -> u64 {
        self.changes.load(Ordering::Relaxed)
    }

    pub fn observation_count(&self) -> u64 {
        self.observations.load(Ordering::Relaxed)
    }
}

impl<T> Debug for ChangeWatcher<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeWatcher")
            .field("state", &self.state())
            .field("changes", &self.change_count())
            .field("observations", &self.observation_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
