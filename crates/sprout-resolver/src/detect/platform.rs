//! Platform gaps and explicit tool conflicts.

use indexmap::IndexSet;
use petgraph::stable_graph::NodeIndex;
use std::collections::HashSet;

use sprout_core::types::DependencyType;

use super::{
    sorted_by_id, ConflictDetail, ConflictType, PlatformIncompatibility, Severity, StrategyKind,
    SuggestedStrategy, ToolConflict,
};
use crate::graph::{PlatformSupport, ToolGraph};

pub(super) fn detect_platform(
    graph: &ToolGraph,
    scope: &IndexSet<NodeIndex>,
    quick: bool,
) -> Vec<(PlatformIncompatibility, ConflictDetail)> {
    let mut found = Vec::new();

    for index in sorted_by_id(graph, scope) {
        let Some(node) = graph.node_at(index) else {
            continue;
        };
        let Some(support) = &node.platform_support else {
            continue;
        };

        let alternatives = &node.descriptor.alternatives;
        let (severity, blocks, auto_resolvable, description, strategies) = match support {
            PlatformSupport::Native { .. } | PlatformSupport::Fallback { accepted: true, .. } => continue,
            PlatformSupport::Fallback { method, .. } => (
                Severity::Minor,
                false,
                true,
                format!("{} can only be installed through emulation via {}", node.id, method.name),
                vec![SuggestedStrategy::new(
                    StrategyKind::FallbackInstallation,
                    0.8,
                    format!("install {} with {}", node.id, method.name),
                )],
            ),
            PlatformSupport::Unsupported { reason } => (
                Severity::Major,
                true,
                !alternatives.is_empty(),
                format!("{} cannot be installed: {}", node.id, reason),
                alternatives
                    .iter()
                    .map(|alternative| {
                        SuggestedStrategy::new(
                            StrategyKind::ToolSubstitution,
                            0.5,
                            format!("replace {} with {}", node.id, alternative),
                        )
                    })
                    .collect(),
            ),
        };

        found.push((
            PlatformIncompatibility {
                tool: node.id.clone(),
                support: support.clone(),
            },
            ConflictDetail {
                id: format!("{}:{}", ConflictType::PlatformIncompatibility, node.id),
                conflict_type: ConflictType::PlatformIncompatibility,
                severity,
                tools: vec![node.id.clone()],
                blocks_installation: blocks,
                auto_resolvable,
                description,
                suggested_strategies: strategies,
            },
        ));
        if quick {
            break;
        }
    }

    found
}

pub(super) fn detect_tool_conflicts(
    graph: &ToolGraph,
    scope: &IndexSet<NodeIndex>,
    quick: bool,
) -> Vec<(ToolConflict, ConflictDetail)> {
    let mut found = Vec::new();
    let mut pairs = HashSet::new();

    for index in sorted_by_id(graph, scope) {
        let tool = graph.id_of(index);

        let mut targets: Vec<&str> = graph
            .dependencies(index)
            .filter(|(target, edge)| edge.dependency_type == DependencyType::Conflicts && scope.contains(target))
            .map(|(target, _)| graph.id_of(target))
            .collect();
        targets.sort();

        for other in targets {
            let pair = if tool < other { (tool, other) } else { (other, tool) };
            if !pairs.insert(pair) {
                continue;
            }

            let substitutable: Vec<&str> = [tool, other]
                .into_iter()
                .filter(|id| graph.node(id).is_some_and(|node| !node.descriptor.alternatives.is_empty()))
                .collect();

            found.push((
                ToolConflict {
                    tool: tool.to_string(),
                    conflicts_with: other.to_string(),
                },
                ConflictDetail {
                    id: format!("{}:{}:{}", ConflictType::ToolConflict, pair.0, pair.1),
                    conflict_type: ConflictType::ToolConflict,
                    severity: Severity::Major,
                    tools: vec![tool.to_string(), other.to_string()],
                    blocks_installation: true,
                    auto_resolvable: !substitutable.is_empty(),
                    description: format!("{} cannot be installed alongside {}", tool, other),
                    suggested_strategies: substitutable
                        .iter()
                        .map(|id| {
                            SuggestedStrategy::new(
                                StrategyKind::ToolSubstitution,
                                0.5,
                                format!("replace {} with an alternative", id),
                            )
                        })
                        .collect(),
                },
            ));
            if quick {
                return found;
            }
        }
    }

    found
}
