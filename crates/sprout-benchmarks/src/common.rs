//! Common utilities for benchmarks

use criterion::Criterion;
use pprof::criterion::{Output, PProfProfiler};

use sprout_core::types::{DeclaredDependency, ToolDescriptor, Version, VersionReq};

/// Configure criterion with flamegraph profiling support
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(std::time::Duration::from_secs(3))
        .measurement_time(std::time::Duration::from_secs(10))
        .sample_size(100)
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
}

pub fn tool_id(index: usize) -> String {
    format!("tool-{:04}", index)
}

/// Acyclic catalog where each tool requires up to three earlier tools
pub fn layered_catalog(size: usize) -> Vec<ToolDescriptor> {
    (0..size)
        .map(|i| {
            let mut descriptor = ToolDescriptor::new(tool_id(i))
                .with_versions((0..3).map(|minor| Version::new(1 + (i % 3) as u64, minor, 0)));
            for step in [1, 7, 31] {
                if i >= step {
                    descriptor = descriptor.with_dependency(DeclaredDependency::required(tool_id(i - step)));
                }
            }
            descriptor
        })
        .collect()
}

/// Layered catalog where every tenth tool pulls tool-0000 to an incompatible range
pub fn conflicting_catalog(size: usize) -> Vec<ToolDescriptor> {
    let mut catalog = layered_catalog(size);
    let old = VersionReq::parse("1.0.x").ok();
    let new = VersionReq::parse(">=1.2").ok();

    for (i, descriptor) in catalog.iter_mut().enumerate().skip(1).step_by(10) {
        let constraint = if i % 20 == 1 { old.clone() } else { new.clone() };
        let mut dependency = DeclaredDependency::required(tool_id(0));
        if let Some(constraint) = constraint {
            dependency = dependency.with_version(constraint);
        }
        descriptor.dependencies.retain(|existing| existing.tool_id != dependency.tool_id);
        descriptor.dependencies.push(dependency);
    }
    catalog
}

/// Every tool id of a catalog, used as the target list
pub fn all_targets(catalog: &[ToolDescriptor]) -> Vec<String> {
    catalog.iter().map(|descriptor| descriptor.id.clone()).collect()
}
