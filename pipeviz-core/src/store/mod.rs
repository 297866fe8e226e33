//! State Store
//!
//! The store is the single owner of [`ApplicationState`](crate::state::ApplicationState).
//! Everything else reads it through `get_state`/`subscribe` and changes it
//! only through `dispatch`.
//!
//! # Dispatch
//!
//! 1. The reducer computes the next revision from the current one.
//! 2. The revision is committed (swapped in as a whole).
//! 3. Every subscriber is called, in registration order, with that revision.
//!
//! Dispatches never interleave. A dispatch from another thread waits for the
//! running one to finish notifying. A dispatch made by a subscriber, on the
//! dispatching thread, is queued and runs once the current notification
//! round completes, so every subscriber sees revisions in commit order.
//!
//! # Lifecycle
//!
//! A store is created explicitly with [`Store::create`] and handed to the
//! components that need it. [`Store::teardown`] drops every subscriber and
//! turns later dispatches into no-ops.

mod state_store;
mod subscriber;

pub use state_store::{Store, Subscription, WeakStore};
pub use subscriber::{Subscriber, SubscriberId};
