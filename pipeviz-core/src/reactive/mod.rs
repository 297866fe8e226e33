//! Reactive change detection.
//!
//! The store already calls its subscribers on every transition, so change
//! detection needs no polling loop: a [`ChangeWatcher`] is called inside the
//! notification path and decides synchronously whether the value it watches
//! moved.

mod watcher;

pub use watcher::{ChangeWatcher, Observation, WatchState};
