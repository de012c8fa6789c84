//! End-to-end pipeline scenarios: build, detect, resolve, order.

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;

use sprout_core::error::SproutError;
use sprout_core::types::{
    Architecture, DeclaredDependency, OperatingSystem, TargetPlatform, ToolDescriptor, Version, VersionReq,
};

use crate::builder::{build, BuildOptions};
use crate::detect::{detect_conflicts, DetectionOptions, Severity, StrategyKind};
use crate::graph::{DependencyEdge, ToolGraph};
use crate::order::{resolve_installation_order, InstallationOrder};
use crate::resolve::{resolve_conflicts, ResolutionPolicy, ResolutionStrategy, StepOutcome};

fn linux_x64() -> TargetPlatform {
    TargetPlatform::new(OperatingSystem::Linux, Architecture::X64)
}

fn build_graph(descriptors: &[ToolDescriptor]) -> ToolGraph {
    let result = build(descriptors, linux_x64(), &BuildOptions::default()).unwrap();
    assert!(result.is_valid(), "{:?}", result.errors);
    result.graph.unwrap()
}

fn requires(id: &str, dependency: &str, req: &str) -> ToolDescriptor {
    ToolDescriptor::new(id).with_dependency(DeclaredDependency::required(dependency).with_version(VersionReq::parse(req).unwrap()))
}

fn tool_name(i: usize) -> String {
    format!("tool{:02}", i)
}

/// Graph over `n` tools where edge (a, b) means tool a requires tool b
fn graph_from_pairs(n: usize, pairs: &[(usize, usize)]) -> ToolGraph {
    let mut graph = ToolGraph::new();
    for i in 0..n {
        graph.add_node(ToolDescriptor::new(tool_name(i)), None).unwrap();
    }
    for &(from, to) in pairs {
        if from < n && to < n && from != to {
            graph.add_edge(&tool_name(from), &tool_name(to), DependencyEdge::required()).unwrap();
        }
    }
    graph
}

fn all_tools(n: usize) -> Vec<String> {
    (0..n).map(tool_name).collect()
}

fn assert_dependencies_first(graph: &ToolGraph, order: &InstallationOrder) {
    let position: HashMap<&str, usize> = order.order.iter().enumerate().map(|(i, id)| (id.as_str(), i)).collect();
    for view in graph.all_edges() {
        if let (Some(from), Some(to)) = (position.get(view.from.as_str()), position.get(view.to.as_str())) {
            assert!(to < from, "{} must come before {}", view.to, view.from);
        }
    }
}

#[test]
fn test_node_npm_react_batches() {
    let graph = build_graph(&[
        ToolDescriptor::new("node"),
        ToolDescriptor::new("npm"),
        ToolDescriptor::new("react")
            .with_dependency(DeclaredDependency::required("node").with_version(VersionReq::parse(">=16").unwrap()))
            .with_dependency(DeclaredDependency::required("npm")),
    ]);

    let detection = detect_conflicts(&graph, &["react"], &DetectionOptions::default()).unwrap();
    assert!(!detection.has_conflicts);
    assert!(detection.can_proceed);

    let order = resolve_installation_order(&graph, &["react"]).unwrap();
    assert_eq!(order.batches, vec![vec!["node", "npm"], vec!["react"]]);
    assert_eq!(order.order, vec!["node", "npm", "react"]);
    assert!(order.circular_dependencies.is_empty());
}

#[test]
fn test_node_version_conflict_is_pinned() {
    let graph = build_graph(&[
        ToolDescriptor::new("node"),
        requires("legacy-app", "node", "16.x"),
        requires("modern-app", "node", ">=18"),
    ]);
    let targets = ["legacy-app", "modern-app"];

    let detection = detect_conflicts(&graph, &targets, &DetectionOptions::default()).unwrap();
    assert!(detection.has_conflicts);
    assert_eq!(detection.severity, Some(Severity::Critical));
    assert!(!detection.can_proceed);

    let conflict = detection.version_conflict("node").unwrap();
    assert_eq!(conflict.requirements.len(), 2);
    assert_eq!(conflict.compromise.as_ref().unwrap().version, Version::new(18, 0, 0));
    let detail = detection.conflict("version-conflict:node").unwrap();
    assert!(detail.blocks_installation);
    assert!(detail
        .suggested_strategies
        .iter()
        .any(|strategy| strategy.strategy == StrategyKind::VersionPinning));

    let result = resolve_conflicts(&detection, &graph, &ResolutionPolicy::default()).unwrap();
    assert!(result.success, "{:?}", result.remaining_conflicts);
    assert_eq!(result.steps.len(), 1);
    assert_eq!(result.steps[0].result, StepOutcome::Success);
    assert!(result.steps[0].reversible);
    assert_eq!(
        result.steps[0].strategy,
        ResolutionStrategy::VersionPinning {
            tool: "node".to_string(),
            version: Version::new(18, 0, 0),
        }
    );
    assert_eq!(result.graph.node("node").unwrap().version_info, Some(Version::new(18, 0, 0)));
    assert_eq!(
        result.installation_order.batches,
        vec![vec!["node"], vec!["legacy-app", "modern-app"]]
    );

    // Input graph is untouched
    assert!(graph.node("node").unwrap().version_info.is_none());
}

#[test]
fn test_pin_to_build_tagged_release() {
    let graph = build_graph(&[
        ToolDescriptor::new("node").with_versions(["16.20.0", "18.0.0+official"].map(|v| v.parse::<Version>().unwrap())),
        requires("legacy-app", "node", "16.x"),
        requires("modern-app", "node", ">=18"),
    ]);
    let detection = detect_conflicts(&graph, &["legacy-app", "modern-app"], &DetectionOptions::default()).unwrap();
    assert_eq!(detection.severity, Some(Severity::Critical));

    let result = resolve_conflicts(&detection, &graph, &ResolutionPolicy::default()).unwrap();
    assert!(result.success, "{:?}", result.remaining_conflicts);
    assert_eq!(
        result.steps[0].strategy,
        ResolutionStrategy::VersionPinning {
            tool: "node".to_string(),
            version: "18.0.0+official".parse().unwrap(),
        }
    );
    assert!(result.remaining_conflicts.is_empty());
}

#[test]
fn test_resolving_same_detection_twice_is_stable() {
    let graph = build_graph(&[
        ToolDescriptor::new("node"),
        requires("legacy-app", "node", "16.x"),
        requires("modern-app", "node", ">=18"),
    ]);
    let detection = detect_conflicts(&graph, &["legacy-app", "modern-app"], &DetectionOptions::default()).unwrap();
    let policy = ResolutionPolicy::default();

    let first = resolve_conflicts(&detection, &graph, &policy).unwrap();
    let second = resolve_conflicts(&detection, &graph, &policy).unwrap();

    assert!(first.remaining_conflicts.is_empty());
    assert!(second.remaining_conflicts.is_empty());
    assert_eq!(first.summary, second.summary);
    assert_eq!(first.steps, second.steps);
    assert_eq!(first.graph, second.graph);
}

#[test]
fn test_lowest_pin_when_not_preferring_latest() {
    let graph = build_graph(&[
        ToolDescriptor::new("node").with_versions(["16.20.0", "18.0.0", "18.19.0", "20.11.0"].map(|v| v.parse::<Version>().unwrap())),
        requires("legacy-app", "node", "16.x"),
        requires("modern-app", "node", ">=18"),
        requires("tooling", "node", ">=17"),
    ]);
    let detection = detect_conflicts(&graph, &["legacy-app", "modern-app", "tooling"], &DetectionOptions::default()).unwrap();

    let policy = ResolutionPolicy {
        prefer_latest_versions: false,
        ..ResolutionPolicy::default()
    };
    let result = resolve_conflicts(&detection, &graph, &policy).unwrap();
    assert!(result.success, "{:?}", result.remaining_conflicts);
    assert_eq!(
        result.steps[0].strategy,
        ResolutionStrategy::VersionPinning {
            tool: "node".to_string(),
            version: Version::new(18, 0, 0),
        }
    );

    let latest = resolve_conflicts(&detection, &graph, &ResolutionPolicy::default()).unwrap();
    assert_eq!(
        latest.steps[0].strategy,
        ResolutionStrategy::VersionPinning {
            tool: "node".to_string(),
            version: Version::new(20, 11, 0),
        }
    );
}

#[test]
fn test_zero_dependency_round_trip() {
    let graph = build_graph(&[ToolDescriptor::new("jq")]);

    let detection = detect_conflicts(&graph, &["jq"], &DetectionOptions::default()).unwrap();
    assert!(!detection.has_conflicts);
    assert_eq!(detection.severity, None);

    let result = resolve_conflicts(&detection, &graph, &ResolutionPolicy::default()).unwrap();
    assert!(result.success);
    assert!(result.steps.is_empty());
    assert_eq!(result.graph, graph);
    assert_eq!(result.installation_order.batches, vec![vec!["jq"]]);

    let json = serde_json::to_string(&result).unwrap();
    let restored: crate::resolve::ResolutionExecutionResult = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, result);
}

#[test]
fn test_no_duplicate_nodes() {
    let result = build(
        &[ToolDescriptor::new("git"), ToolDescriptor::new("git")],
        linux_x64(),
        &BuildOptions {
            validate_during_construction: false,
            ..BuildOptions::default()
        },
    )
    .unwrap();
    let mut graph = result.graph.unwrap();
    assert_eq!(graph.node_count(), 1);
    assert_eq!(result.warnings.len(), 1);

    let err = graph.add_node(ToolDescriptor::new("git"), None).unwrap_err();
    assert!(matches!(err, SproutError::DuplicateNode { ref id } if id == "git"));
}

#[test]
fn test_cycle_reported_by_detection_and_ordering() {
    let graph = graph_from_pairs(4, &[(0, 1), (1, 2), (2, 3), (3, 1)]);
    let targets = [tool_name(0)];

    let detection = detect_conflicts(&graph, &targets, &DetectionOptions::default()).unwrap();
    assert_eq!(detection.circular_dependencies.len(), 1);
    assert_eq!(detection.circular_dependencies[0].cycle, vec!["tool01", "tool02", "tool03"]);

    let order = resolve_installation_order(&graph, &targets).unwrap();
    assert_eq!(order.circular_dependencies, vec![vec!["tool01", "tool02", "tool03"]]);
    assert_eq!(order.blocked, vec!["tool00"]);
}

proptest! {
    #[test]
    fn acyclic_order_puts_dependencies_first(
        n in 1usize..25,
        pairs in prop::collection::vec((0usize..25, 0usize..25), 0..60)
    ) {
        // Only higher-numbered tools depend on lower-numbered ones
        let acyclic: Vec<(usize, usize)> = pairs.into_iter().filter(|(a, b)| a > b).collect();
        let graph = graph_from_pairs(n, &acyclic);

        let order = resolve_installation_order(&graph, &all_tools(n)).unwrap();
        prop_assert!(order.is_complete());
        prop_assert_eq!(order.order.len(), n);
        assert_dependencies_first(&graph, &order);
    }

    #[test]
    fn batches_have_no_internal_dependencies(
        n in 1usize..25,
        pairs in prop::collection::vec((0usize..25, 0usize..25), 0..60)
    ) {
        let acyclic: Vec<(usize, usize)> = pairs.into_iter().filter(|(a, b)| a > b).collect();
        let graph = graph_from_pairs(n, &acyclic);

        let order = resolve_installation_order(&graph, &all_tools(n)).unwrap();
        let flattened: Vec<String> = order.batches.iter().flatten().cloned().collect();
        prop_assert_eq!(&flattened, &order.order);

        for batch in &order.batches {
            let mut sorted = batch.clone();
            sorted.sort();
            prop_assert_eq!(&sorted, batch);
            for from in batch {
                for to in batch {
                    prop_assert!(graph.edge(from, to).is_none());
                }
            }
        }
    }

    #[test]
    fn every_reachable_tool_is_accounted_for(
        n in 1usize..15,
        pairs in prop::collection::vec((0usize..15, 0usize..15), 0..40)
    ) {
        let graph = graph_from_pairs(n, &pairs);
        let targets = all_tools(n);

        let order = resolve_installation_order(&graph, &targets).unwrap();
        let mut seen: HashSet<&str> = HashSet::new();
        for id in order
            .order
            .iter()
            .chain(order.circular_dependencies.iter().flatten())
            .chain(order.blocked.iter())
        {
            prop_assert!(seen.insert(id.as_str()), "{} reported twice", id);
        }
        prop_assert_eq!(seen.len(), n);

        let detection = detect_conflicts(&graph, &targets, &DetectionOptions::default()).unwrap();
        prop_assert_eq!(detection.circular_dependencies.is_empty(), order.circular_dependencies.is_empty());
    }

    #[test]
    fn successful_resolution_is_idempotent(
        n in 2usize..12,
        pairs in prop::collection::vec((0usize..12, 0usize..12), 0..30)
    ) {
        let graph = graph_from_pairs(n, &pairs);
        let targets = [tool_name(0)];
        let policy = ResolutionPolicy::default();

        let detection = detect_conflicts(&graph, &targets, &DetectionOptions::default()).unwrap();
        let first = resolve_conflicts(&detection, &graph, &policy).unwrap();
        prop_assume!(first.success);

        let again = detect_conflicts(&first.graph, &first.targets, &first.options).unwrap();
        prop_assert!(!again.has_conflicts);
        let second = resolve_conflicts(&again, &first.graph, &policy).unwrap();
        prop_assert!(second.success);
        prop_assert!(second.steps.is_empty());
        prop_assert_eq!(&second.graph, &first.graph);
        prop_assert_eq!(&second.installation_order, &first.installation_order);
    }
}
