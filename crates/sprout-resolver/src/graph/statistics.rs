//! On-demand graph metrics.

use petgraph::unionfind::UnionFind;
use petgraph::visit::NodeIndexable;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use sprout_core::types::DependencyType;

use super::ToolGraph;

/// Structural metrics of a graph, computed on every call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub node_count: usize,
    pub edge_count: usize,
    pub required_edges: usize,
    pub optional_edges: usize,
    pub suggested_edges: usize,
    pub conflict_edges: usize,
    /// Weakly connected components
    pub connected_components: usize,
    /// `edges - nodes + components`
    pub cyclomatic_complexity: usize,
    pub average_out_degree: f64,
    /// Edges over the maximum possible number of directed edges
    pub density: f64,
}

impl ToolGraph {
    pub fn statistics(&self) -> GraphStatistics {
        let node_count = self.graph.node_count();
        let edge_count = self.graph.edge_count();

        let (mut required_edges, mut optional_edges, mut suggested_edges, mut conflict_edges) = (0, 0, 0, 0);
        for edge in self.graph.edge_indices().filter_map(|index| self.graph.edge_weight(index)) {
            match edge.dependency_type {
                DependencyType::Required => required_edges += 1,
                DependencyType::Optional => optional_edges += 1,
                DependencyType::Suggests => suggested_edges += 1,
                DependencyType::Conflicts => conflict_edges += 1,
            }
        }

        let connected_components = self.connected_components();
        // Every component of k nodes has at least k - 1 edges
        let cyclomatic_complexity = (edge_count + connected_components).saturating_sub(node_count);

        let average_out_degree = if node_count == 0 {
            0.0
        } else {
            edge_count as f64 / node_count as f64
        };
        let density = if node_count < 2 {
            0.0
        } else {
            edge_count as f64 / (node_count * (node_count - 1)) as f64
        };

        GraphStatistics {
            node_count,
            edge_count,
            required_edges,
            optional_edges,
            suggested_edges,
            conflict_edges,
            connected_components,
            cyclomatic_complexity,
            average_out_degree,
            density,
        }
    }

    /// Number of weakly connected components
    pub fn connected_components(&self) -> usize {
        let mut sets = UnionFind::<usize>::new(self.graph.node_bound());
        for edge in self.graph.edge_indices() {
            if let Some((source, target)) = self.graph.edge_endpoints(edge) {
                sets.union(source.index(), target.index());
            }
        }

        self.graph
            .node_indices()
            .map(|index| sets.find(index.index()))
            .collect::<HashSet<_>>()
            .len()
    }
}
