//! PipeViz Core
//!
//! This crate provides the state synchronization layer of the PipeViz
//! pipeline graph viewer. It implements:
//!
//! - A single-owner state store with action dispatch and subscriptions
//! - Change detection on the graph-relevant projection of that state
//! - Background graph layout with ordered, stale-safe result delivery
//! - Best-effort persistence of user preferences across reloads
//!
//! View components, the query transport and styling live elsewhere and only
//! talk to this crate through the store.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `state`: the state tree, actions and reducer
//! - `store`: the store and its subscriptions
//! - `reactive`: change detection over derived values
//! - `graph`: graph input projection, layout engines and the compute dispatcher
//! - `persist`: snapshots, storage backends and startup loading
//! - `session`: wires everything together for one page session
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pipeviz_core::{InitialProps, MemoryStorage, SyncConfig, SyncSession};
//! use pipeviz_core::state::{Action, Theme};
//!
//! let session = SyncSession::start_layered(
//!     &InitialProps::default(),
//!     Arc::new(MemoryStorage::new()),
//!     &SyncConfig::default(),
//!     tokio::runtime::Handle::current(),
//! );
//!
//! // Persisted, but does not trigger a new layout
//! session.dispatch(Action::ToggleTheme { theme: Theme::Light });
//!
//! session.settled().await;
//! println!("{} nodes laid out", session.state().graph.layout.nodes.len());
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod persist;
pub mod reactive;
pub mod session;
pub mod state;
pub mod store;

pub use config::{LayoutConfig, StaleResultPolicy, SyncConfig};
pub use error::{ComputeError, ConfigError, LayoutError, StorageError};
pub use persist::{FileStorage, MemoryStorage, Storage};
pub use session::SyncSession;
pub use state::{ApplicationState, InitialProps};
pub use store::Store;
