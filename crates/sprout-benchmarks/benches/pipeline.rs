//! Graph pipeline performance benchmarks
//!
//! Benchmarks each stage of build, detect, resolve and order over catalogs of
//! 10, 100 and 1000 tools.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sprout_benchmarks::{all_targets, conflicting_catalog, criterion_config, layered_catalog};
use sprout_core::types::{Architecture, OperatingSystem, TargetPlatform};
use sprout_resolver::{
    build, detect_conflicts, resolve_conflicts, resolve_installation_order, BuildOptions, DetectionOptions,
    ResolutionPolicy, ToolGraph,
};

const SIZES: [usize; 3] = [10, 100, 1000];

fn platform() -> TargetPlatform {
    TargetPlatform::new(OperatingSystem::Linux, Architecture::X64)
}

fn graph_for(catalog: &[sprout_core::types::ToolDescriptor]) -> ToolGraph {
    build(catalog, platform(), &BuildOptions::default())
        .unwrap()
        .graph
        .unwrap()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_build");

    for size in SIZES {
        let catalog = layered_catalog(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("tools", size), &catalog, |b, catalog| {
            b.iter(|| black_box(build(catalog, platform(), &BuildOptions::default()).unwrap()));
        });
    }

    group.finish();
}

fn bench_detect(c: &mut Criterion) {
    let mut group = c.benchmark_group("conflict_detection");

    for size in SIZES {
        let catalog = conflicting_catalog(size);
        let graph = graph_for(&catalog);
        let targets = all_targets(&catalog);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("tools", size), &graph, |b, graph| {
            b.iter(|| black_box(detect_conflicts(graph, &targets, &DetectionOptions::default()).unwrap()));
        });
    }

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("conflict_resolution");
    group.sample_size(20);

    for size in SIZES {
        let catalog = conflicting_catalog(size);
        let graph = graph_for(&catalog);
        let detection = detect_conflicts(&graph, &all_targets(&catalog), &DetectionOptions::default()).unwrap();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("tools", size), &graph, |b, graph| {
            b.iter(|| black_box(resolve_conflicts(&detection, graph, &ResolutionPolicy::default()).unwrap()));
        });
    }

    group.finish();
}

fn bench_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("installation_order");

    for size in SIZES {
        let catalog = layered_catalog(size);
        let graph = graph_for(&catalog);
        let targets = all_targets(&catalog);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("tools", size), &graph, |b, graph| {
            b.iter(|| black_box(resolve_installation_order(graph, &targets).unwrap()));
        });
    }

    group.finish();
}

fn bench_statistics(c: &mut Criterion) {
    let graph = graph_for(&layered_catalog(1000));
    c.bench_function("graph_statistics_1000", |b| b.iter(|| black_box(graph.statistics())));
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_build, bench_detect, bench_resolve, bench_order, bench_statistics
}
criterion_main!(benches);
