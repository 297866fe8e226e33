//! Persistence
//!
//! Keeps user preferences across reloads.
//!
//! - [`PersistedSnapshot`]: the pruned, allow-listed subset of state
//! - [`Storage`]: durable key-value boundary, with in-memory and file backends
//! - [`PersistenceProjector`]: writes a snapshot after every committed change
//! - [`load_initial_state`]: reads the snapshot back once at startup and
//!   merges it beneath the statically supplied props

mod loader;
mod projector;
mod snapshot;
mod storage;

pub use loader::{initial_state, load_initial_state, load_snapshot};
pub use projector::PersistenceProjector;
pub use snapshot::{
    prune_falsey, PersistedLayer, PersistedNode, PersistedNodeType, PersistedPipeline,
    PersistedSnapshot, PersistedTag, EXCLUDED_VISIBLE_FIELDS,
};
pub use storage::{FileStorage, MemoryStorage, Storage};
