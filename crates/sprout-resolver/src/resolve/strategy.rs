//! Strategy selection.
//!
//! Strategies are tried in a fixed priority: version pinning, tool
//! substitution, edge relaxation. Fallback installation only applies to
//! platform findings with an emulated method.

use serde::{Deserialize, Serialize};

use sprout_core::types::{DependencyType, Version};

use crate::detect::{
    CircularDependency, ConflictDetail, ConflictDetectionResult, ConflictType, StrategyKind,
    VersionConflict,
};
use crate::graph::{PlatformSupport, ToolGraph};
use crate::semver::{candidate_versions, ConstraintSolver};

use super::ResolutionPolicy;

/// A concrete remedy for one conflict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum ResolutionStrategy {
    /// Select `version` and rewrite the constraints it misses
    VersionPinning { tool: String, version: Version },
    /// Point dependents of `tool` at `replacement`
    ToolSubstitution { tool: String, replacement: String },
    /// Demote `from -> to` to optional and drop it
    EdgeRelaxation { from: String, to: String },
    /// Accept the emulated installation method
    FallbackInstallation { tool: String },
}

impl ResolutionStrategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            ResolutionStrategy::VersionPinning { .. } => StrategyKind::VersionPinning,
            ResolutionStrategy::ToolSubstitution { .. } => StrategyKind::ToolSubstitution,
            ResolutionStrategy::EdgeRelaxation { .. } => StrategyKind::EdgeRelaxation,
            ResolutionStrategy::FallbackInstallation { .. } => StrategyKind::FallbackInstallation,
        }
    }
}

/// Choose the strategy for `conflict`, or `None` when the policy leaves no option
pub fn select_strategy(
    conflict: &ConflictDetail,
    detection: &ConflictDetectionResult,
    graph: &ToolGraph,
    targets: &[String],
    policy: &ResolutionPolicy,
) -> Option<ResolutionStrategy> {
    match conflict.conflict_type {
        ConflictType::VersionConflict => {
            let version_conflict = detection.version_conflict(conflict.tools.first()?)?;
            pin_version(version_conflict, graph, policy)
                .or_else(|| substitute(&version_conflict.tool, graph, policy))
                .or_else(|| relax_requirement(version_conflict, graph, targets, policy))
        }
        ConflictType::CircularDependency => relax_cycle(&conflict.tools, graph, targets, policy),
        ConflictType::PlatformIncompatibility => {
            let tool = conflict.tools.first()?;
            match graph.node(tool)?.platform_support.as_ref()? {
                PlatformSupport::Fallback { accepted: false, .. } => {
                    Some(ResolutionStrategy::FallbackInstallation { tool: tool.clone() })
                }
                PlatformSupport::Unsupported { .. } => substitute(tool, graph, policy),
                PlatformSupport::Native { .. } | PlatformSupport::Fallback { .. } => None,
            }
        }
        // The tool that is conflicted against is replaced first
        ConflictType::ToolConflict => conflict
            .tools
            .iter()
            .rev()
            .find_map(|tool| substitute(tool, graph, policy)),
    }
}

fn pin_version(
    conflict: &VersionConflict,
    graph: &ToolGraph,
    policy: &ResolutionPolicy,
) -> Option<ResolutionStrategy> {
    let version = if policy.prefer_latest_versions {
        conflict.compromise.as_ref()?.version.clone()
    } else {
        let node = graph.node(&conflict.tool)?;
        let solver = conflict.solver();
        solver.compromise(&candidate_versions(node, &solver), false)?.version
    };

    Some(ResolutionStrategy::VersionPinning {
        tool: conflict.tool.clone(),
        version,
    })
}

fn substitute(tool: &str, graph: &ToolGraph, policy: &ResolutionPolicy) -> Option<ResolutionStrategy> {
    if !policy.allow_breaking_changes {
        return None;
    }

    graph
        .node(tool)?
        .descriptor
        .alternatives
        .iter()
        .find(|alternative| is_viable_replacement(tool, alternative, graph))
        .map(|alternative| ResolutionStrategy::ToolSubstitution {
            tool: tool.to_string(),
            replacement: alternative.clone(),
        })
}

/// A replacement must exist, be installable and keep its own incoming
/// constraints satisfiable. Retargeted edges drop their constraints, which
/// were written against the replaced tool's releases.
fn is_viable_replacement(tool: &str, alternative: &str, graph: &ToolGraph) -> bool {
    if alternative == tool {
        return false;
    }
    let Some(candidate) = graph.node(alternative) else {
        return false;
    };
    if !candidate
        .platform_support
        .as_ref()
        .map_or(true, PlatformSupport::is_viable)
    {
        return false;
    }

    let mut solver = ConstraintSolver::new();
    for view in graph.incoming_edges(alternative) {
        if view.edge.dependency_type == DependencyType::Required {
            if let Some(constraint) = view.edge.version_constraint {
                solver.add_constraint(view.from, constraint);
            }
        }
    }
    solver.is_satisfiable()
}

fn relax_requirement(
    conflict: &VersionConflict,
    graph: &ToolGraph,
    targets: &[String],
    policy: &ResolutionPolicy,
) -> Option<ResolutionStrategy> {
    if !policy.allow_edge_relaxation {
        return None;
    }

    let solver = conflict.solver();
    conflict
        .requirements
        .iter()
        .filter(|req| !solver.intersection_without(Some(req.requirer.as_str())).is_empty())
        .find(|req| can_relax(&req.requirer, &conflict.tool, graph, targets))
        .map(|req| ResolutionStrategy::EdgeRelaxation {
            from: req.requirer.clone(),
            to: conflict.tool.clone(),
        })
}

fn relax_cycle(
    cycle: &[String],
    graph: &ToolGraph,
    targets: &[String],
    policy: &ResolutionPolicy,
) -> Option<ResolutionStrategy> {
    if !policy.allow_edge_relaxation {
        return None;
    }

    let cycle = CircularDependency { cycle: cycle.to_vec() };
    let edges = cycle.edges();
    let (closing, rest) = edges.split_last()?;

    std::iter::once(closing)
        .chain(rest)
        .find(|(from, to)| can_relax(from, to, graph, targets))
        .map(|(from, to)| ResolutionStrategy::EdgeRelaxation {
            from: from.to_string(),
            to: to.to_string(),
        })
}

/// An edge may be relaxed unless it is a target's only required dependency
fn can_relax(from: &str, to: &str, graph: &ToolGraph, targets: &[String]) -> bool {
    let Some(edge) = graph.edge(from, to) else {
        return false;
    };
    if edge.dependency_type != DependencyType::Required || !targets.iter().any(|target| target == from) {
        return true;
    }

    let required = graph
        .outgoing_edges(from)
        .iter()
        .filter(|view| view.edge.dependency_type == DependencyType::Required)
        .count();
    required > 1
}
