//! Integration Tests for the Sync Layer
//!
//! These tests drive a full session: store, graph watcher, background layout
//! and persistence together.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pipeviz_core::graph::{graph_input, ComputedGraph, GraphInput, LayoutEngine};
use pipeviz_core::persist::{PersistedSnapshot, Storage, EXCLUDED_VISIBLE_FIELDS};
use pipeviz_core::reactive::{ChangeWatcher, Observation};
use pipeviz_core::state::{
    Action, ApplicationState, EdgeRecord, InitialProps, NodeRecord, NodeType, PipelineData,
    PipelineRecord, Theme,
};
use pipeviz_core::{FileStorage, LayoutError, MemoryStorage, SyncConfig, SyncSession};
use tokio::runtime::Handle;

fn node(id: &str, kind: NodeType, pipelines: &[&str]) -> NodeRecord {
    NodeRecord {
        id: id.to_string(),
        name: id.to_string(),
        pretty_name: None,
        node_type: kind,
        tags: Vec::new(),
        pipelines: pipelines.iter().map(|p| p.to_string()).collect(),
        layer: None,
        modular_pipelines: Vec::new(),
    }
}

fn edge(source: &str, target: &str) -> EdgeRecord {
    EdgeRecord {
        source: source.to_string(),
        target: target.to_string(),
    }
}

fn pipeline_data() -> PipelineData {
    PipelineData {
        nodes: vec![
            node("companies", NodeType::Data, &[]),
            node("preprocess", NodeType::Task, &["__default__", "dp"]),
            node("model_input", NodeType::Data, &["__default__", "dp"]),
            node("train", NodeType::Task, &["__default__", "ds"]),
        ],
        edges: vec![
            edge("companies", "preprocess"),
            edge("preprocess", "model_input"),
            edge("model_input", "train"),
        ],
        pipelines: vec![
            PipelineRecord::new("__default__", "Default"),
            PipelineRecord::new("dp", "Data Processing"),
            PipelineRecord::new("ds", "Data Science"),
        ],
        ..PipelineData::default()
    }
}

/// Layout engine that counts how often it runs.
fn counting_engine() -> (Arc<dyn LayoutEngine>, Arc<AtomicUsize>) {
    let runs = Arc::new(AtomicUsize::new(0));
    let runs_clone = runs.clone();
    let inner = pipeviz_core::graph::LayeredLayout::default();
    let engine = move |input: &GraphInput| -> Result<ComputedGraph, LayoutError> {
        runs_clone.fetch_add(1, Ordering::SeqCst);
        inner.layout(input)
    };
    (Arc::new(engine), runs)
}

fn start(storage: Arc<dyn Storage>, props: InitialProps) -> (SyncSession, Arc<AtomicUsize>) {
    let (engine, runs) = counting_engine();
    let session = SyncSession::start(&props, storage, engine, &SyncConfig::default(), Handle::current());
    (session, runs)
}

fn stored_snapshot(storage: &dyn Storage) -> PersistedSnapshot {
    let raw = storage
        .read(&SyncConfig::default().storage_key)
        .unwrap()
        .expect("snapshot written");
    PersistedSnapshot::from_json(&raw).unwrap()
}

/// Static data is laid out once at startup, before any user action.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn first_observation_triggers_one_layout() {
    let storage = Arc::new(MemoryStorage::new());
    let (session, runs) = start(storage, InitialProps::with_data(pipeline_data()));

    assert_eq!(session.dispatcher().latest_sequence(), 1);
    session.settled().await;

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    // One write at startup, one for the committed layout result.
    assert_eq!(session.projector().write_count(), 2);
    let state = session.state();
    assert_eq!(state.graph.sequence, 1);
    assert_eq!(state.graph.layout.nodes.len(), 4);
    assert_eq!(state.graph.layout.node("train").unwrap().rank, 3);
}

/// Changes outside the graph input do not start a layout job.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn ui_only_actions_do_not_relayout() {
    let storage = Arc::new(MemoryStorage::new());
    let (session, runs) = start(storage, InitialProps::with_data(pipeline_data()));
    session.settled().await;

    session.dispatch(Action::ToggleTheme { theme: Theme::Light });
    session.dispatch(Action::ToggleExportModal { visible: true });
    session.dispatch(Action::ToggleNodeHovered {
        node_id: Some("train".into()),
    });
    session.dispatch(Action::Unknown);
    session.settled().await;

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(session.dispatcher().latest_sequence(), 1);
    assert_eq!(session.watcher().change_count(), 1);
}

/// Changes to the graph input start exactly one new layout each.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn graph_changes_relayout_and_replace_graph() {
    let storage = Arc::new(MemoryStorage::new());
    let (session, runs) = start(storage, InitialProps::with_data(pipeline_data()));
    session.settled().await;

    session.dispatch(Action::UpdateActivePipeline {
        pipeline: "ds".into(),
    });
    session.settled().await;

    assert_eq!(runs.load(Ordering::SeqCst), 2);
    let ids: Vec<String> = session
        .state()
        .graph
        .layout
        .nodes
        .iter()
        .map(|node| node.id.clone())
        .collect();
    assert_eq!(ids, vec!["companies".to_string(), "train".to_string()]);

    // Disabling and re-enabling returns to a projection already seen, but the
    // watcher compares with the latest one, so both steps relayout.
    session.dispatch(Action::ToggleNodesDisabled {
        node_ids: vec!["companies".into()],
        is_disabled: true,
    });
    session.dispatch(Action::ToggleNodesDisabled {
        node_ids: vec!["companies".into()],
        is_disabled: false,
    });
    session.settled().await;

    assert_eq!(runs.load(Ordering::SeqCst), 4);
    assert_eq!(session.state().graph.sequence, 4);
    assert_eq!(session.state().graph.layout.nodes.len(), 2);
}

/// Disabled-node entries that are false never reach storage.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn persisted_disabled_nodes_are_pruned() {
    let storage = Arc::new(MemoryStorage::new());
    let (session, _) = start(storage.clone(), InitialProps::with_data(pipeline_data()));

    session.dispatch(Action::ToggleNodesDisabled {
        node_ids: vec!["companies".into(), "train".into(), "preprocess".into()],
        is_disabled: true,
    });
    session.dispatch(Action::ToggleNodesDisabled {
        node_ids: vec!["train".into()],
        is_disabled: false,
    });
    session.settled().await;

    let snapshot = stored_snapshot(storage.as_ref());
    let keys: Vec<&str> = snapshot.node.disabled.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["companies", "preprocess"]);
    assert!(snapshot.node.disabled.values().all(|disabled| *disabled));

    // Reloading yields a subset of the live mapping, missing only the false entry.
    let live = session.state().node.disabled.clone();
    session.teardown();
    let (reloaded, _) = start(storage.clone(), InitialProps::with_data(pipeline_data()));
    let restored = reloaded.state().node.disabled.clone();
    for (id, disabled) in &restored {
        assert_eq!(live.get(id), Some(disabled));
    }
    assert_eq!(live.len() - restored.len(), 1);
    assert!(!restored.contains_key("train"));
    reloaded.settled().await;
}

/// Modal and focus-mode flags are never persisted, even when set.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn transient_visibility_is_never_persisted() {
    let storage = Arc::new(MemoryStorage::new());
    let (session, _) = start(storage.clone(), InitialProps::with_data(pipeline_data()));

    session.dispatch(Action::ToggleExportModal { visible: true });
    session.dispatch(Action::TogglePlotModal { visible: true });
    session.dispatch(Action::ToggleSettingsModal { visible: true });
    session.dispatch(Action::ToggleModularPipelineFocusMode {
        modular_pipeline: Some("feature_engineering".into()),
    });
    session.dispatch(Action::ToggleSidebar { visible: false });
    session.settled().await;

    let raw = storage
        .read(&SyncConfig::default().storage_key)
        .unwrap()
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let visible = value["visible"].as_object().unwrap();
    for field in EXCLUDED_VISIBLE_FIELDS {
        assert!(!visible.contains_key(field));
    }
    assert_eq!(visible["sidebar"], false);

    // After a reload the modal is closed again but the sidebar stays hidden.
    session.teardown();
    let (reloaded, _) = start(storage, InitialProps::with_data(pipeline_data()));
    assert!(!reloaded.state().visible.export_modal);
    assert!(reloaded.state().visible.modular_pipeline_focus_mode.is_none());
    assert!(!reloaded.state().visible.sidebar);
    reloaded.settled().await;
}

/// Persisted preferences fill gaps; explicit props win.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn startup_merges_persisted_beneath_props() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .write(
            &SyncConfig::default().storage_key,
            r#"{"theme": "light", "pipeline": {"active": "dp"}}"#,
        )
        .unwrap();

    let (from_storage, _) = start(storage.clone(), InitialProps::with_data(pipeline_data()));
    assert_eq!(from_storage.state().theme, Theme::Light);
    assert_eq!(from_storage.state().pipeline.active.as_deref(), Some("dp"));
    from_storage.settled().await;
    from_storage.teardown();

    storage
        .write(
            &SyncConfig::default().storage_key,
            r#"{"theme": "light", "pipeline": {"active": "dp"}}"#,
        )
        .unwrap();
    let mut data = pipeline_data();
    data.selected_pipeline = Some("ds".into());
    let (from_props, _) = start(storage, InitialProps::with_data(data));
    assert_eq!(from_props.state().pipeline.active.as_deref(), Some("ds"));
    assert_eq!(from_props.state().theme, Theme::Light);
    from_props.settled().await;
}

/// Structurally equal projections built separately compare equal.
#[test]
fn fresh_equal_projections_are_unchanged() {
    let state = ApplicationState::from_data(&pipeline_data());
    let watcher = ChangeWatcher::new(graph_input);

    assert!(watcher.observe(&state).is_changed());
    // A deep copy shares nothing with the original.
    let copy: ApplicationState =
        serde_json::from_str(&serde_json::to_string(&state).unwrap()).unwrap();
    assert_eq!(watcher.observe(&copy), Observation::Unchanged);
    assert_eq!(graph_input(&state), graph_input(&copy));
}

/// A failing storage backend never interrupts the session.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn storage_failures_do_not_break_dispatch() {
    let storage = Arc::new(MemoryStorage::with_quota(16));
    let (session, runs) = start(storage.clone(), InitialProps::with_data(pipeline_data()));

    session.dispatch(Action::ToggleTheme { theme: Theme::Light });
    session.settled().await;

    assert_eq!(session.state().theme, Theme::Light);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(session.projector().failure_count() >= 2);
    assert!(storage.is_empty());
}

/// A failing layout leaves the last good graph in place.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn layout_failure_keeps_previous_graph() {
    let mut data = pipeline_data();
    data.edges.push(edge("train", "preprocess"));
    data.nodes.push(node("report", NodeType::Task, &["ds"]));
    let storage = Arc::new(MemoryStorage::new());
    let session = SyncSession::start_layered(
        &InitialProps::with_data(data),
        storage,
        &SyncConfig::default(),
        Handle::current(),
    );
    session.settled().await;

    // The default pipeline contains a cycle, so nothing was laid out.
    assert_eq!(session.dispatcher().failed_count(), 1);
    assert!(session.state().graph.layout.nodes.is_empty());

    session.dispatch(Action::UpdateActivePipeline {
        pipeline: "ds".into(),
    });
    session.settled().await;
    assert_eq!(session.state().graph.layout.nodes.len(), 3);
}

/// Sessions survive a restart through file storage.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn file_storage_persists_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(dir.path()).unwrap());

    let (session, _) = start(storage.clone(), InitialProps::with_data(pipeline_data()));
    session.dispatch(Action::ToggleTextLabels { text_labels: false });
    session.dispatch(Action::ChangeFlag {
        name: "expandAllPipelines".into(),
        value: true,
    });
    session.settled().await;
    session.teardown();

    let (reloaded, _) = start(storage, InitialProps::with_data(pipeline_data()));
    assert!(!reloaded.state().text_labels);
    assert_eq!(reloaded.state().flags.get("expandAllPipelines"), Some(&true));
    reloaded.settled().await;
}

/// Results arriving after teardown are dropped.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn teardown_stops_everything() {
    let storage = Arc::new(MemoryStorage::new());
    let (session, _) = start(storage.clone(), InitialProps::with_data(pipeline_data()));
    let store = session.store().clone();
    let writes_before = session.projector().write_count();
    let revision = store.revision();

    session.teardown();
    store.dispatch(Action::ToggleTheme { theme: Theme::Light });

    assert!(store.is_torn_down());
    assert_eq!(store.subscriber_count(), 0);
    assert_eq!(store.get_state().theme, Theme::Dark);
    assert_eq!(store.revision(), revision);
    assert!(writes_before >= 1);
}
