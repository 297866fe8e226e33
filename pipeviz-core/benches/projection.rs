//! Benchmarks for the per-dispatch graph projection and change check.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use pipeviz_core::graph::graph_input;
use pipeviz_core::reactive::ChangeWatcher;
use pipeviz_core::state::{
    ApplicationState, EdgeRecord, NodeRecord, NodeType, PipelineData, PipelineRecord, Theme,
};

/// A chain of `width` parallel lanes, `depth` nodes deep.
fn generated_state(width: usize, depth: usize) -> ApplicationState {
    let mut nodes = Vec::with_capacity(width * depth);
    let mut edges = Vec::new();
    for lane in 0..width {
        for step in 0..depth {
            let kind = if step % 2 == 0 { NodeType::Data } else { NodeType::Task };
            nodes.push(NodeRecord {
                id: format!("n{lane}_{step}"),
                name: format!("node {lane} {step}"),
                pretty_name: None,
                node_type: kind,
                tags: vec![format!("lane{}", lane % 4)],
                pipelines: vec!["__default__".into()],
                layer: None,
                modular_pipelines: Vec::new(),
            });
            if step > 0 {
                edges.push(EdgeRecord {
                    source: format!("n{lane}_{}", step - 1),
                    target: format!("n{lane}_{step}"),
                });
            }
        }
    }
    ApplicationState::from_data(&PipelineData {
        nodes,
        edges,
        pipelines: vec![PipelineRecord::new("__default__", "Default")],
        ..PipelineData::default()
    })
}

fn bench_graph_input(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_input");
    for width in [10, 100] {
        let state = generated_state(width, 20);
        group.bench_with_input(BenchmarkId::from_parameter(width * 20), &state, |b, state| {
            b.iter(|| graph_input(black_box(state)))
        });
    }
    group.finish();
}

fn bench_unchanged_observation(c: &mut Criterion) {
    let state = generated_state(100, 20);
    let watcher = ChangeWatcher::new(graph_input);
    watcher.observe(&state);

    // A theme change is the common case: new state, same graph input.
    let mut themed = state.clone();
    themed.theme = Theme::Light;

    c.bench_function("observe_unchanged_2000", |b| {
        b.iter(|| watcher.observe(black_box(&themed)))
    });
}

criterion_group!(benches, bench_graph_input, bench_unchanged_observation);
criterion_main!(benches);
