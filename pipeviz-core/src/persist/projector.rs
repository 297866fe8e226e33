//! Persistence Projector
//!
//! Subscribed to the store, the projector writes a fresh snapshot of every
//! committed revision. Writes are best-effort: a failed write is logged and
//! the session carries on.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{trace, warn};

use super::snapshot::PersistedSnapshot;
use super::storage::Storage;
use crate::error::StorageError;
use crate::state::ApplicationState;

pub struct PersistenceProjector {
    storage: Arc<dyn Storage>,
    key: String,
    writes: AtomicU64,
    failures: AtomicU64,
}

impl PersistenceProjector {
    pub fn new(storage: Arc<dyn Storage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            writes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Build the snapshot of `state` without writing it.
    pub fn project(&self, state: &ApplicationState) -> PersistedSnapshot {
        PersistedSnapshot::from_state(state)
    }

    /// Snapshot `state` and write it under the configured key.
    pub fn persist(&self, state: &ApplicationState) -> Result<(), StorageError> {
        let json = self.project(state).to_json()?;
        self.storage.write(&self.key, &json)?;
        self.writes.fetch_add(1, Ordering::Relaxed);
        trace!(key = %self.key, bytes = json.len(), "snapshot written");
        Ok(())
    }

    /// Store listener: persist and swallow failures.
    pub fn on_state(&self, state: &ApplicationState) {
        if let Err(err) = self.persist(state) {
            self.failures.fetch_add(1, Ordering::Relaxed);
            warn!(key = %self.key, error = %err, "failed to persist state");
        }
    }

    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for PersistenceProjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceProjector")
            .field("key", &self.key)
            .field("writes", &self.write_count())
            .field("failures", &self.failure_count())
            .finish()
    }
}
