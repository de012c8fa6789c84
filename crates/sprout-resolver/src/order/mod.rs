//! Installation ordering
//!
//! Kahn's algorithm over the subgraph reachable from the requested tools.
//! Every round removes the tools whose followed dependencies are all placed;
//! those tools form one batch that can be installed in parallel. Tools left
//! over are either on a cycle or stuck behind one, and are reported instead
//! of being dropped.

use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;
use petgraph::stable_graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use sprout_core::error::SproutError;
use sprout_core::types::DependencyType;

use crate::detect::{ConflictDetectionResult, Severity};
use crate::graph::ToolGraph;
use crate::ResolverResult;

/// Options controlling ordering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OrderingOptions {
    /// Install optional dependencies and order them like required ones
    pub include_optional: bool,
}

impl Default for OrderingOptions {
    fn default() -> Self {
        Self { include_optional: true }
    }
}

/// A dependency that is not part of the order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredDependency {
    pub from: String,
    pub to: String,
    pub dependency_type: DependencyType,
}

/// Installation order for a set of targets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationOrder {
    /// Linear sequence, dependencies first
    pub order: Vec<String>,
    /// `order` split into groups with no dependency between members
    pub batches: Vec<Vec<String>>,
    /// Optional and suggested relations that were not followed
    pub deferred: Vec<DeferredDependency>,
    /// Strongly connected groups that could not be ordered
    pub circular_dependencies: Vec<Vec<String>>,
    /// Acyclic tools that wait on a cycle
    pub blocked: Vec<String>,
}

impl InstallationOrder {
    /// Whether every reachable tool was ordered
    pub fn is_complete(&self) -> bool {
        self.circular_dependencies.is_empty() && self.blocked.is_empty()
    }

    /// Position of a tool in the linear order
    pub fn position(&self, id: &str) -> Option<usize> {
        self.order.iter().position(|entry| entry == id)
    }
}

/// Order the tools reachable from `targets` with default options
pub fn resolve_installation_order<S: AsRef<str>>(graph: &ToolGraph, targets: &[S]) -> ResolverResult<InstallationOrder> {
    resolve_installation_order_with(graph, targets, &OrderingOptions::default())
}

/// Order the tools reachable from `targets`
pub fn resolve_installation_order_with<S: AsRef<str>>(
    graph: &ToolGraph,
    targets: &[S],
    options: &OrderingOptions,
) -> ResolverResult<InstallationOrder> {
    let include_optional = options.include_optional;
    let roots = graph.resolve_targets(targets)?;
    let reachable = graph.reachable_from(&roots, include_optional);

    let mut deferred = Vec::new();
    let mut pending: HashMap<NodeIndex, usize> = HashMap::with_capacity(reachable.len());
    for &index in &reachable {
        let mut count = 0;
        for (target, edge) in graph.dependencies(index) {
            if edge.is_followed(include_optional) {
                count += 1;
            } else if matches!(edge.dependency_type, DependencyType::Optional | DependencyType::Suggests) {
                deferred.push(DeferredDependency {
                    from: graph.id_of(index).to_string(),
                    to: graph.id_of(target).to_string(),
                    dependency_type: edge.dependency_type,
                });
            }
        }
        pending.insert(index, count);
    }
    deferred.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));

    let mut batches: Vec<Vec<String>> = Vec::new();
    let mut ready: Vec<NodeIndex> = reachable
        .iter()
        .copied()
        .filter(|index| pending.get(index) == Some(&0))
        .collect();

    while !ready.is_empty() {
        ready.sort_by(|a, b| graph.id_of(*a).cmp(graph.id_of(*b)));

        let mut next = Vec::new();
        for &index in &ready {
            for (dependent, edge) in graph.dependents(index) {
                if !edge.is_followed(include_optional) {
                    continue;
                }
                if let Some(count) = pending.get_mut(&dependent) {
                    if *count > 0 {
                        *count -= 1;
                        if *count == 0 {
                            next.push(dependent);
                        }
                    }
                }
            }
        }

        let batch: Vec<String> = ready.iter().map(|index| graph.id_of(*index).to_string()).collect();
        debug!(batch = batches.len() + 1, tools = ?batch, "batch ordered");
        batches.push(batch);
        ready = next;
    }

    let leftover: Vec<NodeIndex> = reachable
        .iter()
        .copied()
        .filter(|index| pending.get(index).is_some_and(|count| *count > 0))
        .collect();
    let (circular_dependencies, blocked) = classify_leftover(graph, &leftover, include_optional);

    if !circular_dependencies.is_empty() {
        warn!(
            cycles = circular_dependencies.len(),
            blocked = blocked.len(),
            "installation order is partial"
        );
    }

    let order: Vec<String> = batches.iter().flatten().cloned().collect();
    info!(tools = order.len(), batches = batches.len(), "installation order resolved");

    Ok(InstallationOrder {
        order,
        batches,
        deferred,
        circular_dependencies,
        blocked,
    })
}

/// Split unordered tools into cyclic groups and tools blocked behind them
fn classify_leftover(
    graph: &ToolGraph,
    leftover: &[NodeIndex],
    include_optional: bool,
) -> (Vec<Vec<String>>, Vec<String>) {
    let mut sub: DiGraph<NodeIndex, ()> = DiGraph::new();
    let mut local = HashMap::new();
    for &index in leftover {
        local.insert(index, sub.add_node(index));
    }
    for &index in leftover {
        for (target, edge) in graph.dependencies(index) {
            if !edge.is_followed(include_optional) {
                continue;
            }
            if let (Some(&from), Some(&to)) = (local.get(&index), local.get(&target)) {
                sub.add_edge(from, to, ());
            }
        }
    }

    let mut cycles = Vec::new();
    let mut blocked = Vec::new();
    for component in tarjan_scc(&sub) {
        let mut ids: Vec<String> = component
            .iter()
            .filter_map(|local_index| sub.node_weight(*local_index))
            .map(|index| graph.id_of(*index).to_string())
            .collect();
        if ids.len() > 1 {
            ids.sort();
            cycles.push(ids);
        } else {
            blocked.extend(ids);
        }
    }

    cycles.sort();
    blocked.sort();
    (cycles, blocked)
}

/// Order the detection's targets, refusing while critical conflicts remain
pub fn plan_installation(graph: &ToolGraph, detection: &ConflictDetectionResult) -> ResolverResult<InstallationOrder> {
    let options = OrderingOptions {
        include_optional: detection.options.include_optional,
    };
    plan_installation_with(graph, detection, &options)
}

/// Like [`plan_installation`] with explicit ordering options
pub fn plan_installation_with(
    graph: &ToolGraph,
    detection: &ConflictDetectionResult,
    options: &OrderingOptions,
) -> ResolverResult<InstallationOrder> {
    if !detection.can_proceed {
        let critical: Vec<&str> = detection
            .conflicts
            .iter()
            .filter(|conflict| conflict.severity == Severity::Critical)
            .map(|conflict| conflict.id.as_str())
            .collect();
        return Err(SproutError::InstallationBlocked {
            count: critical.len(),
            conflicts: critical.join(", "),
        });
    }

    resolve_installation_order_with(graph, &detection.targets, options)
}
