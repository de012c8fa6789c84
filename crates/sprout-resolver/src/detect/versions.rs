//! Version conflict detection.

use indexmap::IndexSet;
use petgraph::stable_graph::NodeIndex;

use sprout_core::types::DependencyType;

use super::{
    sorted_by_id, ConflictDetail, ConflictType, Severity, StrategyKind, SuggestedStrategy,
    VersionConflict, VersionRequirement,
};
use crate::graph::{ToolGraph, ToolNode};
use crate::semver::candidate_versions;

pub(super) fn detect(
    graph: &ToolGraph,
    scope: &IndexSet<NodeIndex>,
    quick: bool,
) -> Vec<(VersionConflict, ConflictDetail)> {
    let mut found = Vec::new();

    for index in sorted_by_id(graph, scope) {
        let Some(node) = graph.node_at(index) else {
            continue;
        };

        let requirements = requirements_on(graph, index, scope);
        if requirements.len() < 2 {
            continue;
        }

        let mut conflict = VersionConflict {
            tool: node.id.clone(),
            requirements,
            severity: Severity::Critical,
            compromise: None,
        };
        let solver = conflict.solver();
        let intersection = solver.intersection();

        conflict.severity = if intersection.is_empty() {
            Severity::Critical
        } else if !node.descriptor.versions.is_empty()
            && !node.descriptor.versions.iter().any(|version| intersection.contains(version))
        {
            Severity::Major
        } else {
            continue;
        };

        conflict.compromise = solver.compromise(&candidate_versions(node, &solver), true);

        let detail = describe(&conflict, node);
        found.push((conflict, detail));
        if quick {
            break;
        }
    }

    found
}

/// Constrained required edges into `index` from tools in `scope`, by requirer id
fn requirements_on(graph: &ToolGraph, index: NodeIndex, scope: &IndexSet<NodeIndex>) -> Vec<VersionRequirement> {
    let mut requirements: Vec<VersionRequirement> = graph
        .dependents(index)
        .filter(|(source, edge)| edge.dependency_type == DependencyType::Required && scope.contains(source))
        .filter_map(|(source, edge)| {
            Some(VersionRequirement {
                requirer: graph.id_of(source).to_string(),
                constraint: edge.version_constraint.clone()?,
            })
        })
        .collect();
    requirements.sort_by(|a, b| a.requirer.cmp(&b.requirer));
    requirements
}

fn describe(conflict: &VersionConflict, node: &ToolNode) -> ConflictDetail {
    let solver = conflict.solver();
    let listing = conflict
        .requirements
        .iter()
        .map(|req| format!("{} requires {}", req.requirer, req.constraint))
        .collect::<Vec<_>>()
        .join(", ");

    let description = match conflict.severity {
        Severity::Critical => format!("No version of {} satisfies every requirement: {}", conflict.tool, listing),
        _ => format!(
            "Requirements on {} only overlap outside its known releases: {}",
            conflict.tool, listing
        ),
    };

    let mut strategies = Vec::new();
    if let Some(compromise) = &conflict.compromise {
        let confidence = compromise.satisfied.len() as f64 / conflict.requirements.len() as f64;
        strategies.push(SuggestedStrategy::new(
            StrategyKind::VersionPinning,
            confidence,
            format!("pin {} to {}", conflict.tool, compromise.version),
        ));
    }
    if !node.descriptor.alternatives.is_empty() {
        strategies.push(SuggestedStrategy::new(
            StrategyKind::ToolSubstitution,
            0.4,
            format!("replace {} with {}", conflict.tool, node.descriptor.alternatives.join(" or ")),
        ));
    }
    let sole_source = conflict
        .requirements
        .iter()
        .find(|req| !solver.intersection_without(Some(&req.requirer)).is_empty());
    if let Some(requirement) = sole_source {
        strategies.push(SuggestedStrategy::new(
            StrategyKind::EdgeRelaxation,
            0.3,
            format!("make {} -> {} optional", requirement.requirer, conflict.tool),
        ));
    }

    let mut tools = vec![conflict.tool.clone()];
    tools.extend(conflict.requirements.iter().map(|req| req.requirer.clone()));

    ConflictDetail {
        id: format!("{}:{}", ConflictType::VersionConflict, conflict.tool),
        conflict_type: ConflictType::VersionConflict,
        severity: conflict.severity,
        tools,
        blocks_installation: conflict.severity == Severity::Critical,
        auto_resolvable: conflict.compromise.is_some(),
        description,
        suggested_strategies: strategies,
    }
}
