//! Graph mutations performed by resolution steps.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use sprout_core::error::SproutError;
use sprout_core::types::{DependencyType, Version, VersionReq};

use crate::graph::{DependencyEdge, PlatformSupport, ToolGraph};
use crate::ResolverResult;

use super::ResolutionStrategy;

/// A constraint replaced by a version pin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintRewrite {
    pub requirer: String,
    pub previous: Option<VersionReq>,
    pub pinned: VersionReq,
}

/// Concrete mutation for one strategy, with what it needs to be undone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ResolutionAction {
    PinVersion {
        tool: String,
        version: Version,
        previous_version: Option<Version>,
        rewrites: Vec<ConstraintRewrite>,
    },
    SubstituteTool {
        tool: String,
        replacement: String,
        /// Dependents whose edges move to the replacement
        retargeted: Vec<String>,
    },
    RelaxEdge {
        from: String,
        to: String,
        removed: DependencyEdge,
        /// The edge as it would look once demoted
        demoted: DependencyEdge,
    },
    AcceptFallback {
        tool: String,
        method: String,
    },
}

impl ResolutionAction {
    /// Work out the mutation for `strategy` against the current graph
    pub fn plan(strategy: &ResolutionStrategy, graph: &ToolGraph) -> ResolverResult<Self> {
        match strategy {
            ResolutionStrategy::VersionPinning { tool, version } => {
                let node = graph.node(tool).ok_or_else(|| SproutError::unknown_node(tool.clone()))?;
                let pinned = VersionReq::exact(version);
                let rewrites = graph
                    .incoming_edges(tool)
                    .into_iter()
                    .filter(|view| view.edge.dependency_type == DependencyType::Required)
                    .filter(|view| {
                        view.edge
                            .version_constraint
                            .as_ref()
                            .is_some_and(|constraint| !constraint.matches(version))
                    })
                    .map(|view| ConstraintRewrite {
                        requirer: view.from,
                        previous: view.edge.version_constraint,
                        pinned: pinned.clone(),
                    })
                    .collect();

                Ok(ResolutionAction::PinVersion {
                    tool: tool.clone(),
                    version: version.clone(),
                    previous_version: node.version_info.clone(),
                    rewrites,
                })
            }
            ResolutionStrategy::ToolSubstitution { tool, replacement } => {
                graph.require_index(tool)?;
                graph.require_index(replacement)?;
                let retargeted = graph
                    .incoming_edges(tool)
                    .into_iter()
                    .filter(|view| view.edge.dependency_type.is_dependency() && view.from != *replacement)
                    .map(|view| view.from)
                    .collect();

                Ok(ResolutionAction::SubstituteTool {
                    tool: tool.clone(),
                    replacement: replacement.clone(),
                    retargeted,
                })
            }
            ResolutionStrategy::EdgeRelaxation { from, to } => {
                let removed = graph
                    .edge(from, to)
                    .cloned()
                    .ok_or_else(|| SproutError::resolution_step("edge-relaxation", format!("no edge {} -> {}", from, to)))?;
                let demoted = DependencyEdge {
                    dependency_type: DependencyType::Optional,
                    version_constraint: removed.version_constraint.clone(),
                };

                Ok(ResolutionAction::RelaxEdge {
                    from: from.clone(),
                    to: to.clone(),
                    removed,
                    demoted,
                })
            }
            ResolutionStrategy::FallbackInstallation { tool } => {
                let node = graph.node(tool).ok_or_else(|| SproutError::unknown_node(tool.clone()))?;
                match &node.platform_support {
                    Some(PlatformSupport::Fallback { method, .. }) => Ok(ResolutionAction::AcceptFallback {
                        tool: tool.clone(),
                        method: method.name.clone(),
                    }),
                    _ => Err(SproutError::resolution_step(
                        "fallback-installation",
                        format!("{} has no emulated installation method", tool),
                    )),
                }
            }
        }
    }

    /// Apply to `graph`, updating `targets` for substitutions. Returns side effects.
    pub fn apply(&self, graph: &mut ToolGraph, targets: &mut Vec<String>) -> ResolverResult<Vec<String>> {
        let mut effects = Vec::new();

        match self {
            ResolutionAction::PinVersion {
                tool,
                version,
                rewrites,
                ..
            } => {
                for rewrite in rewrites {
                    let edge = take_edge(graph, &rewrite.requirer, tool, "version-pinning")?;
                    graph.add_edge(
                        &rewrite.requirer,
                        tool,
                        DependencyEdge {
                            dependency_type: edge.dependency_type,
                            version_constraint: Some(rewrite.pinned.clone()),
                        },
                    )?;
                    effects.push(format!(
                        "constraint of {} on {} changed from {} to {}",
                        rewrite.requirer,
                        tool,
                        describe_constraint(&rewrite.previous),
                        rewrite.pinned
                    ));
                }
                graph.select_version(tool, Some(version.clone()))?;
                effects.push(format!("{} selected at {}", tool, version));
            }
            ResolutionAction::SubstituteTool {
                tool,
                replacement,
                retargeted,
            } => {
                for dependent in retargeted {
                    let edge = take_edge(graph, dependent, tool, "tool-substitution")?;
                    graph.add_edge(dependent, replacement, DependencyEdge::new(edge.dependency_type))?;
                    effects.push(format!("{} now depends on {} instead of {}", dependent, replacement, tool));
                }
                if targets.iter().any(|target| target == tool) {
                    for target in targets.iter_mut() {
                        if target == tool {
                            *target = replacement.clone();
                        }
                    }
                    let mut seen = HashSet::new();
                    targets.retain(|target| seen.insert(target.clone()));
                    effects.push(format!("target {} replaced by {}", tool, replacement));
                }
            }
            ResolutionAction::RelaxEdge { from, to, .. } => {
                take_edge(graph, from, to, "edge-relaxation")?;
                effects.push(format!("{} -> {} demoted to optional and removed from the active graph", from, to));
            }
            ResolutionAction::AcceptFallback { tool, method } => {
                let support = graph.node(tool).and_then(|node| node.platform_support.clone());
                let Some(PlatformSupport::Fallback { method: selected, .. }) = support else {
                    return Err(SproutError::resolution_step(
                        "fallback-installation",
                        format!("{} has no emulated installation method", tool),
                    ));
                };
                graph.set_platform_support(
                    tool,
                    Some(PlatformSupport::Fallback {
                        method: selected,
                        accepted: true,
                    }),
                )?;
                effects.push(format!("{} will be installed with {} under emulation", tool, method));
            }
        }

        Ok(effects)
    }

    /// Undo a previously applied action
    pub fn revert(&self, graph: &mut ToolGraph) -> ResolverResult<()> {
        match self {
            ResolutionAction::PinVersion {
                tool,
                previous_version,
                rewrites,
                ..
            } => {
                for rewrite in rewrites {
                    let edge = take_edge(graph, &rewrite.requirer, tool, "version-pinning")?;
                    graph.add_edge(
                        &rewrite.requirer,
                        tool,
                        DependencyEdge {
                            dependency_type: edge.dependency_type,
                            version_constraint: rewrite.previous.clone(),
                        },
                    )?;
                }
                graph.select_version(tool, previous_version.clone())?;
            }
            ResolutionAction::SubstituteTool { .. } => {
                return Err(SproutError::resolution_step("tool-substitution", "substitutions cannot be reverted"));
            }
            ResolutionAction::RelaxEdge { from, to, removed, .. } => {
                graph.add_edge(from, to, removed.clone())?;
            }
            ResolutionAction::AcceptFallback { tool, .. } => {
                if let Some(PlatformSupport::Fallback { method, .. }) =
                    graph.node(tool).and_then(|node| node.platform_support.clone())
                {
                    graph.set_platform_support(tool, Some(PlatformSupport::Fallback { method, accepted: false }))?;
                }
            }
        }
        Ok(())
    }

    pub fn is_reversible(&self) -> bool {
        !matches!(self, ResolutionAction::SubstituteTool { .. })
    }

    /// Human readable summary
    pub fn describe(&self) -> String {
        match self {
            ResolutionAction::PinVersion { tool, version, rewrites, .. } => format!(
                "Pin {} to {} ({} constraint(s) rewritten)",
                tool,
                version,
                rewrites.len()
            ),
            ResolutionAction::SubstituteTool { tool, replacement, .. } => {
                format!("Replace {} with {}", tool, replacement)
            }
            ResolutionAction::RelaxEdge { from, to, .. } => {
                format!("Make the dependency {} -> {} optional", from, to)
            }
            ResolutionAction::AcceptFallback { tool, method } => {
                format!("Install {} with {} under emulation", tool, method)
            }
        }
    }
}

fn take_edge(graph: &mut ToolGraph, from: &str, to: &str, action: &str) -> ResolverResult<DependencyEdge> {
    graph
        .remove_edge(from, to)
        .ok_or_else(|| SproutError::resolution_step(action, format!("no edge {} -> {}", from, to)))
}

fn describe_constraint(constraint: &Option<VersionReq>) -> String {
    constraint
        .as_ref()
        .map_or_else(|| "*".to_string(), ToString::to_string)
}
