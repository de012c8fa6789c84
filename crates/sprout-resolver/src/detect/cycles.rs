//! Iterative cycle detection.

use indexmap::IndexSet;
use petgraph::stable_graph::NodeIndex;
use std::collections::{HashMap, HashSet};

use super::{
    sorted_by_id, CircularDependency, ConflictDetail, ConflictType, Severity, StrategyKind,
    SuggestedStrategy,
};
use crate::graph::ToolGraph;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Finished,
}

struct Frame {
    node: NodeIndex,
    successors: Vec<NodeIndex>,
    position: usize,
}

pub(super) fn detect(
    graph: &ToolGraph,
    scope: &IndexSet<NodeIndex>,
    include_optional: bool,
    quick: bool,
) -> Vec<(CircularDependency, ConflictDetail)> {
    find_cycles(graph, scope, include_optional, quick)
        .into_iter()
        .map(|cycle| {
            let detail = describe(&cycle);
            (cycle, detail)
        })
        .collect()
}

/// Find cycles among `scope` over followed edges
///
/// Depth-first search with an explicit stack; every back edge to a node on
/// the current path yields one cycle. Cycles are rotated so the smallest id
/// comes first and reported once each.
pub fn find_cycles(
    graph: &ToolGraph,
    scope: &IndexSet<NodeIndex>,
    include_optional: bool,
    stop_at_first: bool,
) -> Vec<CircularDependency> {
    let mut visits: HashMap<NodeIndex, Visit> = HashMap::new();
    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut cycles = Vec::new();

    for start in sorted_by_id(graph, scope) {
        if visits.contains_key(&start) {
            continue;
        }

        let mut path = vec![start];
        let mut stack = vec![Frame {
            node: start,
            successors: successors(graph, start, scope, include_optional),
            position: 0,
        }];
        visits.insert(start, Visit::InProgress);

        loop {
            let Some(frame) = stack.last_mut() else {
                break;
            };
            let next = frame.successors.get(frame.position).copied();
            frame.position += 1;

            let Some(next) = next else {
                let finished = frame.node;
                stack.pop();
                path.pop();
                visits.insert(finished, Visit::Finished);
                continue;
            };

            match visits.get(&next) {
                None => {
                    visits.insert(next, Visit::InProgress);
                    path.push(next);
                    stack.push(Frame {
                        node: next,
                        successors: successors(graph, next, scope, include_optional),
                        position: 0,
                    });
                }
                Some(Visit::InProgress) => {
                    let Some(begin) = path.iter().position(|node| *node == next) else {
                        continue;
                    };
                    let ids = normalize(path[begin..].iter().map(|node| graph.id_of(*node).to_string()).collect());
                    if seen.insert(ids.clone()) {
                        cycles.push(CircularDependency { cycle: ids });
                        if stop_at_first {
                            return cycles;
                        }
                    }
                }
                Some(Visit::Finished) => {}
            }
        }
    }

    cycles
}

fn successors(
    graph: &ToolGraph,
    node: NodeIndex,
    scope: &IndexSet<NodeIndex>,
    include_optional: bool,
) -> Vec<NodeIndex> {
    let mut next: Vec<NodeIndex> = graph
        .dependencies(node)
        .filter(|(target, edge)| edge.is_followed(include_optional) && scope.contains(target))
        .map(|(target, _)| target)
        .collect();
    next.sort_by(|a, b| graph.id_of(*a).cmp(graph.id_of(*b)));
    next
}

/// Rotate so the smallest id leads
fn normalize(mut ids: Vec<String>) -> Vec<String> {
    let pivot = ids
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(i, _)| i)
        .unwrap_or(0);
    ids.rotate_left(pivot);
    ids
}

fn describe(cycle: &CircularDependency) -> ConflictDetail {
    let closing = cycle
        .edges()
        .last()
        .map(|(from, to)| format!("{} -> {}", from, to))
        .unwrap_or_default();

    ConflictDetail {
        id: format!("{}:{}", ConflictType::CircularDependency, cycle.cycle.join("->")),
        conflict_type: ConflictType::CircularDependency,
        severity: Severity::Critical,
        tools: cycle.cycle.clone(),
        blocks_installation: true,
        auto_resolvable: true,
        description: format!("Circular dependency detected: {}", cycle.display_path()),
        suggested_strategies: vec![SuggestedStrategy::new(
            StrategyKind::EdgeRelaxation,
            0.6,
            format!("relax the edge {} that closes the cycle", closing),
        )],
    }
}
