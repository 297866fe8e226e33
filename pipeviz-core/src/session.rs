//! Sync Session
//!
//! Wires the store, the graph watcher, the compute dispatcher and the
//! persistence projector together for one page session.
//!
//! # Startup
//!
//! 1. Load the persisted snapshot and merge it beneath the props.
//! 2. Create the store with the merged state.
//! 3. Observe the initial state and submit the first layout job, so static
//!    data renders before any user action.
//! 4. Subscribe the watcher (graph input changes submit new jobs) and then
//!    the projector (every change is persisted).
//!
//! [`SyncSession::teardown`] undoes the wiring and tears the store down.

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::info;

use crate::config::SyncConfig;
use crate::graph::{graph_input, GraphComputeDispatcher, GraphInput, LayeredLayout, LayoutEngine};
use crate::persist::{load_initial_state, PersistenceProjector, Storage};
use crate::reactive::{ChangeWatcher, Observation};
use crate::state::{Action, ApplicationState, InitialProps};
use crate::store::{Store, Subscription};

pub struct SyncSession {
    store: Store,
    watcher: Arc<ChangeWatcher<GraphInput>>,
    dispatcher: Arc<GraphComputeDispatcher>,
    projector: Arc<PersistenceProjector>,
    subscriptions: Vec<Subscription>,
}

impl SyncSession {
    /// Start a session laying graphs out with `engine`.
    ///
    /// Layout jobs run on `runtime`.
    pub fn start(
        props: &InitialProps,
        storage: Arc<dyn Storage>,
        engine: Arc<dyn LayoutEngine>,
        config: &SyncConfig,
        runtime: Handle,
    ) -> Self {
        let state = load_initial_state(props, storage.as_ref(), &config.storage_key);
        let store = Store::create(state);

        let watcher = Arc::new(ChangeWatcher::new(graph_input));
        let dispatcher = GraphComputeDispatcher::new(&store, engine, runtime, config.stale_results);
        let projector = Arc::new(PersistenceProjector::new(storage, config.storage_key.clone()));

        if let Observation::Changed(input) = watcher.observe(&store.get_state()) {
            dispatcher.submit(input);
        }

        let graph_subscription = {
            let watcher = Arc::clone(&watcher);
            let dispatcher = Arc::clone(&dispatcher);
            store.subscribe(move |state| {
                if let Observation::Changed(input) = watcher.observe(state) {
                    dispatcher.submit(input);
                }
            })
        };
        let persist_subscription = {
            let projector = Arc::clone(&projector);
            store.subscribe(move |state| projector.on_state(state))
        };

        if config.persist_on_start {
            projector.on_state(&store.get_state());
        }

        info!(
            key = %config.storage_key,
            nodes = store.get_state().node.records.len(),
            "sync session started"
        );

        Self {
            store,
            watcher,
            dispatcher,
            projector,
            subscriptions: vec![graph_subscription, persist_subscription],
        }
    }

    /// Start a session using the bundled [`LayeredLayout`].
    pub fn start_layered(
        props: &InitialProps,
        storage: Arc<dyn Storage>,
        config: &SyncConfig,
        runtime: Handle,
    ) -> Self {
        let engine = Arc::new(LayeredLayout::new(config.layout.clone()));
        Self::start(props, storage, engine, config, runtime)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn state(&self) -> Arc<ApplicationState> {
        self.store.get_state()
    }

    pub fn dispatch(&self, action: Action) {
        self.store.dispatch(action);
    }

    pub fn watcher(&self) -> &ChangeWatcher<GraphInput> {
        &self.watcher
    }

    pub fn dispatcher(&self) -> &GraphComputeDispatcher {
        &self.dispatcher
    }

    pub fn projector(&self) -> &PersistenceProjector {
        &self.projector
    }

    /// Wait for every layout job submitted so far to complete.
    pub async fn settled(&self) {
        self.dispatcher.settled().await;
    }

    /// Unsubscribe everything and tear the store down.
    ///
    /// Layout jobs still running complete but their results are dropped.
    pub fn teardown(mut self) {
        self.dispatcher.close();
        self.subscriptions.clear();
        self.store.teardown();
        info!("sync session torn down");
    }
}

impl std::fmt::Debug for SyncSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSession")
            .field("store", &self.store)
            .field("dispatcher", &self.dispatcher)
            .field("projector", &self.projector)
            .finish()
    }
}
