//! Graph Compute Dispatcher
//!
//! Runs layout jobs off the dispatching thread and feeds their results back
//! into the store as `UPDATE_GRAPH_LAYOUT` actions.
//!
//! # Ordering
//!
//! Every submitted job gets a sequence number, increasing by one per job.
//! Jobs are not cancelled when a newer one is submitted; they race. With
//! [`StaleResultPolicy::Discard`] a result is only applied if no newer job
//! was submitted after it, and the reducer refuses any result older than the
//! one already in the state. With [`StaleResultPolicy::Accept`] results are
//! applied in completion order.
//!
//! # Failures
//!
//! A failed job is logged and not retried. The graph slice keeps the last
//! accepted layout.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, error, warn};

use super::input::GraphInput;
use super::layout::{ComputedGraph, LayoutEngine};
use crate::config::StaleResultPolicy;
use crate::error::ComputeError;
use crate::state::Action;
use crate::store::{Store, WeakStore};

pub struct GraphComputeDispatcher {
    store: WeakStore,
    engine: Arc<dyn LayoutEngine>,
    runtime: Handle,
    policy: StaleResultPolicy,

    /// Sequence number of the latest submitted job.
    issued: AtomicU64,

    /// Number of jobs that have not completed yet.
    in_flight: watch::Sender<usize>,

    applied: AtomicU64,
    failed: AtomicU64,
    discarded: AtomicU64,
    closed: AtomicBool,
}

impl GraphComputeDispatcher {
    /// Create a dispatcher writing results into `store`.
    ///
    /// Jobs run on `runtime`'s blocking pool.
    pub fn new(
        store: &Store,
        engine: Arc<dyn LayoutEngine>,
        runtime: Handle,
        policy: StaleResultPolicy,
    ) -> Arc<Self> {
        let (in_flight, _) = watch::channel(0);
        Arc::new(Self {
            store: store.downgrade(),
            engine,
            runtime,
            policy,
            issued: AtomicU64::new(0),
            in_flight,
            applied: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        })
    }

    /// Submit a layout job for `input` and return its sequence number.
    ///
    /// Returns immediately; the result arrives later as a store dispatch.
    pub fn submit(self: &Arc<Self>, input: GraphInput) -> u64 {
        let sequence = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.in_flight.send_modify(|count| *count += 1);
        debug!(
            sequence,
            nodes = input.nodes.len(),
            edges = input.edges.len(),
            "layout job submitted"
        );

        // Counted down on every exit path, including a panicking subscriber
        // during delivery or the task being dropped unpolled.
        let ticket = InFlightJob {
            dispatcher: Arc::clone(self),
        };

        let engine = Arc::clone(&self.engine);
        let job = self.runtime.spawn_blocking(move || engine.layout(&input));

        self.runtime.spawn(async move {
            let outcome = match job.await {
                Ok(result) => result.map_err(ComputeError::from),
                Err(join_error) => Err(ComputeError::from(join_error)),
            };
            ticket.dispatcher.complete(sequence, outcome);
            drop(ticket);
        });

        sequence
    }

    fn complete(&self, sequence: u64, outcome: Result<ComputedGraph, ComputeError>) {
        match outcome {
            Ok(graph) => self.deliver(sequence, graph),
            Err(err @ ComputeError::Layout(_)) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                warn!(sequence, error = %err, "layout job failed, keeping last graph");
            }
            Err(err) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                error!(sequence, error = %err, "layout worker did not finish");
            }
        }
    }

    fn deliver(&self, sequence: u64, graph: ComputedGraph) {
        if self.closed.load(Ordering::SeqCst) {
            debug!(sequence, "dispatcher closed, dropping layout result");
            return;
        }

        let sequence = match self.policy {
            StaleResultPolicy::Discard => {
                let latest = self.issued.load(Ordering::SeqCst);
                if sequence < latest {
                    self.discarded.fetch_add(1, Ordering::Relaxed);
                    debug!(sequence, latest, "discarding stale layout result");
                    return;
                }
                Some(sequence)
            }
            StaleResultPolicy::Accept => None,
        };

        let Some(store) = self.store.upgrade() else {
            debug!("store dropped before layout result arrived");
            return;
        };
        self.applied.fetch_add(1, Ordering::Relaxed);
        store.dispatch(Action::UpdateGraphLayout { graph, sequence });
    }

    /// Wait until every submitted job has completed.
    pub async fn settled(&self) {
        let mut in_flight = self.in_flight.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = in_flight.wait_for(|count| *count == 0).await;
    }

    /// Stop applying results. Jobs already running still finish.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Sequence number of the latest submitted job, 0 if none.
    pub fn latest_sequence(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        *self.in_flight.borrow()
    }

    /// Results handed to the store.
    pub fn applied_count(&self) -> u64 {
        self.applied.load(Ordering::Relaxed)
    }

    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Results dropped because a newer job had been submitted.
    pub fn discarded_count(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }
}

/// One submitted job in the in-flight count.
struct InFlightJob {
    dispatcher: Arc<GraphComputeDispatcher>,
}

impl Drop for InFlightJob {
    fn drop(&mut self) {
        self.dispatcher
            .in_flight
            .send_modify(|count| *count = count.saturating_sub(1));
    }
}

impl std::fmt::Debug for GraphComputeDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphComputeDispatcher")
            .field("policy", &self.policy)
            .field("latest_sequence", &self.latest_sequence())
            .field("in_flight", &self.in_flight())
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}
