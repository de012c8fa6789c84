//! Tool dependency graph implementation using petgraph
//!
//! Nodes are tools keyed by id and edges are dependency relations. All id
//! lookups go through insertion-ordered indices, so every snapshot the graph
//! hands out is deterministic.

mod statistics;

pub use statistics::GraphStatistics;

use indexmap::{IndexMap, IndexSet};
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use sprout_core::error::SproutError;
use sprout_core::types::{
    DeclaredDependency, DependencyType, InstallationMethod, InstallationStatus, ToolDescriptor,
    Version, VersionReq,
};

use crate::ResolverResult;

/// Node in the dependency graph representing one tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolNode {
    /// Unique tool id
    pub id: String,
    /// Manifest data the node was built from
    pub descriptor: ToolDescriptor,
    /// Whether the tool is already present on the target system
    #[serde(default)]
    pub installation_status: InstallationStatus,
    /// Version selected for this run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_info: Option<Version>,
    /// Installation method chosen for the target platform; `None` when the
    /// node was never evaluated against a platform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_support: Option<PlatformSupport>,
}

/// Result of matching a tool's installation methods against the target platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "support", rename_all = "lowercase")]
pub enum PlatformSupport {
    /// A method runs natively on the target
    Native { method: InstallationMethod },
    /// Only a method for an emulated architecture exists
    Fallback {
        method: InstallationMethod,
        /// Set once the emulated method has been accepted for installation
        #[serde(default)]
        accepted: bool,
    },
    /// No installation path exists
    Unsupported { reason: String },
}

/// Edge in the dependency graph: `from` depends on `to`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// Relation kind
    pub dependency_type: DependencyType,
    /// Version constraint the dependency must satisfy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_constraint: Option<VersionReq>,
}

/// Owned view of one edge, used in snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeView {
    pub from: String,
    pub to: String,
    #[serde(flatten)]
    pub edge: DependencyEdge,
}

/// Plain serialized form of a [`ToolGraph`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<ToolNode>,
    pub edges: Vec<EdgeView>,
}

/// Dependency graph of tools
///
/// Invariants: tool ids are unique, both endpoints of every edge exist, and
/// there is at most one edge per ordered pair of tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "GraphSnapshot", try_from = "GraphSnapshot")]
pub struct ToolGraph {
    /// Underlying directed graph
    graph: StableDiGraph<ToolNode, DependencyEdge>,
    /// Tool id to node, in insertion order
    node_map: IndexMap<String, NodeIndex>,
    /// Ordered endpoint pair to edge, in insertion order
    edge_map: IndexMap<(NodeIndex, NodeIndex), EdgeIndex>,
}

impl ToolGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self {
            graph: StableDiGraph::new(),
            node_map: IndexMap::new(),
            edge_map: IndexMap::new(),
        }
    }
}

impl Default for ToolGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolGraph {
    /// Add a tool node. Fails without touching the graph if the id exists.
    pub fn add_node(
        &mut self,
        descriptor: ToolDescriptor,
        status: Option<InstallationStatus>,
    ) -> ResolverResult<NodeIndex> {
        if self.node_map.contains_key(&descriptor.id) {
            return Err(SproutError::DuplicateNode { id: descriptor.id });
        }

        let id = descriptor.id.clone();
        let node = ToolNode {
            id: id.clone(),
            descriptor,
            installation_status: status.unwrap_or_default(),
            version_info: None,
            platform_support: None,
        };

        let index = self.graph.add_node(node);
        self.node_map.insert(id, index);
        Ok(index)
    }

    /// Add a dependency edge, merging into an existing edge for the same pair
    pub fn add_edge(&mut self, from: &str, to: &str, edge: DependencyEdge) -> ResolverResult<EdgeIndex> {
        let from_index = self.require_index(from)?;
        let to_index = self.require_index(to)?;

        if from_index == to_index {
            return Err(SproutError::SelfDependency { id: from.to_string() });
        }

        if let Some(&existing) = self.edge_map.get(&(from_index, to_index)) {
            if let Some(weight) = self.graph.edge_weight_mut(existing) {
                weight.merge(edge);
            }
            return Ok(existing);
        }

        let index = self.graph.add_edge(from_index, to_index, edge);
        self.edge_map.insert((from_index, to_index), index);
        Ok(index)
    }

    /// Remove the edge `from -> to`, returning it if it existed
    pub fn remove_edge(&mut self, from: &str, to: &str) -> Option<DependencyEdge> {
        let key = (self.node_index(from)?, self.node_index(to)?);
        let index = self.edge_map.shift_remove(&key)?;
        self.graph.remove_edge(index)
    }

    /// Set the version selected for a tool, returning the previous selection
    pub fn select_version(&mut self, id: &str, version: Option<Version>) -> ResolverResult<Option<Version>> {
        let node = self.node_mut(id)?;
        Ok(std::mem::replace(&mut node.version_info, version))
    }

    /// Record the platform method selection for a tool, returning the previous one
    pub fn set_platform_support(
        &mut self,
        id: &str,
        support: Option<PlatformSupport>,
    ) -> ResolverResult<Option<PlatformSupport>> {
        let node = self.node_mut(id)?;
        Ok(std::mem::replace(&mut node.platform_support, support))
    }

    fn node_mut(&mut self, id: &str) -> ResolverResult<&mut ToolNode> {
        let index = self.require_index(id)?;
        self.graph
            .node_weight_mut(index)
            .ok_or_else(|| SproutError::unknown_node(id))
    }

    /// Get a tool node by id
    pub fn node(&self, id: &str) -> Option<&ToolNode> {
        let index = self.node_map.get(id)?;
        self.graph.node_weight(*index)
    }

    /// Get a tool node by handle
    pub fn node_at(&self, index: NodeIndex) -> Option<&ToolNode> {
        self.graph.node_weight(index)
    }

    /// Id of the node behind a handle, empty for a stale handle
    pub fn id_of(&self, index: NodeIndex) -> &str {
        self.graph
            .node_weight(index)
            .map(|node| node.id.as_str())
            .unwrap_or_default()
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    /// Like [`ToolGraph::node_index`] but fails with `UnknownNode`
    pub fn require_index(&self, id: &str) -> ResolverResult<NodeIndex> {
        self.node_index(id).ok_or_else(|| SproutError::unknown_node(id))
    }

    /// Resolve target ids to handles, dropping repeats and keeping order
    pub fn resolve_targets<S: AsRef<str>>(&self, targets: &[S]) -> ResolverResult<Vec<NodeIndex>> {
        let mut resolved = IndexSet::new();
        for target in targets {
            resolved.insert(self.require_index(target.as_ref())?);
        }
        Ok(resolved.into_iter().collect())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_map.contains_key(id)
    }

    /// Get the edge `from -> to`
    pub fn edge(&self, from: &str, to: &str) -> Option<&DependencyEdge> {
        let key = (self.node_index(from)?, self.node_index(to)?);
        let index = self.edge_map.get(&key)?;
        self.graph.edge_weight(*index)
    }

    /// All nodes in insertion order
    pub fn all_nodes(&self) -> Vec<&ToolNode> {
        self.node_map
            .values()
            .filter_map(|index| self.graph.node_weight(*index))
            .collect()
    }

    /// All edges in insertion order
    pub fn all_edges(&self) -> Vec<EdgeView> {
        self.edge_map
            .iter()
            .filter_map(|(&(from, to), index)| self.view(from, to, *index))
            .collect()
    }

    /// Edges leaving `id`, ordered by target id. Unknown ids have no edges.
    pub fn outgoing_edges(&self, id: &str) -> Vec<EdgeView> {
        self.edges_of(id, Direction::Outgoing)
    }

    /// Edges entering `id`, ordered by source id. Unknown ids have no edges.
    pub fn incoming_edges(&self, id: &str) -> Vec<EdgeView> {
        self.edges_of(id, Direction::Incoming)
    }

    fn edges_of(&self, id: &str, direction: Direction) -> Vec<EdgeView> {
        let Some(index) = self.node_index(id) else {
            return Vec::new();
        };

        let mut views: Vec<EdgeView> = self
            .graph
            .edges_directed(index, direction)
            .filter_map(|edge| self.view(edge.source(), edge.target(), edge.id()))
            .collect();

        match direction {
            Direction::Outgoing => views.sort_by(|a, b| a.to.cmp(&b.to)),
            Direction::Incoming => views.sort_by(|a, b| a.from.cmp(&b.from)),
        }
        views
    }

    fn view(&self, from: NodeIndex, to: NodeIndex, index: EdgeIndex) -> Option<EdgeView> {
        Some(EdgeView {
            from: self.graph.node_weight(from)?.id.clone(),
            to: self.graph.node_weight(to)?.id.clone(),
            edge: self.graph.edge_weight(index)?.clone(),
        })
    }

    /// Dependencies of a node with their edges
    pub fn dependencies(&self, index: NodeIndex) -> impl Iterator<Item = (NodeIndex, &DependencyEdge)> {
        self.graph
            .edges_directed(index, Direction::Outgoing)
            .map(|edge| (edge.target(), edge.weight()))
    }

    /// Dependents of a node with their edges
    pub fn dependents(&self, index: NodeIndex) -> impl Iterator<Item = (NodeIndex, &DependencyEdge)> {
        self.graph
            .edges_directed(index, Direction::Incoming)
            .map(|edge| (edge.source(), edge.weight()))
    }

    /// Nodes reachable from `roots` over followed edges, roots included,
    /// in breadth-first order
    pub fn reachable_from(&self, roots: &[NodeIndex], include_optional: bool) -> IndexSet<NodeIndex> {
        let mut reached: IndexSet<NodeIndex> = roots.iter().copied().collect();
        let mut queue: VecDeque<NodeIndex> = roots.iter().copied().collect();

        while let Some(current) = queue.pop_front() {
            for (next, edge) in self.dependencies(current) {
                if edge.is_followed(include_optional) && reached.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        reached
    }

    /// Get number of tools in the graph
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get number of relations in the graph
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Plain snapshot of the graph
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.all_nodes().into_iter().cloned().collect(),
            edges: self.all_edges(),
        }
    }
}

/// Graphs are equal when they hold the same nodes and edges, regardless of
/// the order edges were added in
impl PartialEq for ToolGraph {
    fn eq(&self, other: &Self) -> bool {
        let sorted = |graph: &ToolGraph| {
            let mut edges = graph.all_edges();
            edges.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));
            edges
        };
        self.all_nodes() == other.all_nodes() && sorted(self) == sorted(other)
    }
}

impl From<ToolGraph> for GraphSnapshot {
    fn from(graph: ToolGraph) -> Self {
        graph.snapshot()
    }
}

impl TryFrom<GraphSnapshot> for ToolGraph {
    type Error = SproutError;

    fn try_from(snapshot: GraphSnapshot) -> Result<Self, Self::Error> {
        let mut graph = ToolGraph::new();

        for node in snapshot.nodes {
            let id = node.id.clone();
            if id != node.descriptor.id {
                return Err(SproutError::ConfigValidation {
                    field: format!("nodes.{}", id),
                    reason: format!("descriptor id '{}' does not match node id", node.descriptor.id),
                });
            }
            graph.add_node(node.descriptor, Some(node.installation_status))?;
            graph.select_version(&id, node.version_info)?;
            graph.set_platform_support(&id, node.platform_support)?;
        }

        for view in snapshot.edges {
            graph.add_edge(&view.from, &view.to, view.edge)?;
        }

        Ok(graph)
    }
}

impl PlatformSupport {
    /// Whether some method can install the tool
    pub fn is_viable(&self) -> bool {
        !matches!(self, PlatformSupport::Unsupported { .. })
    }

    /// Selected method, if any
    pub fn method(&self) -> Option<&InstallationMethod> {
        match self {
            PlatformSupport::Native { method } | PlatformSupport::Fallback { method, .. } => Some(method),
            PlatformSupport::Unsupported { .. } => None,
        }
    }
}

impl DependencyEdge {
    /// Create a new edge without a version constraint
    pub fn new(dependency_type: DependencyType) -> Self {
        Self {
            dependency_type,
            version_constraint: None,
        }
    }

    pub fn required() -> Self {
        Self::new(DependencyType::Required)
    }

    pub fn optional() -> Self {
        Self::new(DependencyType::Optional)
    }

    pub fn suggests() -> Self {
        Self::new(DependencyType::Suggests)
    }

    pub fn conflicts() -> Self {
        Self::new(DependencyType::Conflicts)
    }

    /// Attach a version constraint
    pub fn with_constraint(mut self, constraint: VersionReq) -> Self {
        self.version_constraint = Some(constraint);
        self
    }

    /// Whether traversals for installation follow this edge
    pub fn is_followed(&self, include_optional: bool) -> bool {
        match self.dependency_type {
            DependencyType::Required => true,
            DependencyType::Optional => include_optional,
            DependencyType::Conflicts | DependencyType::Suggests => false,
        }
    }

    fn merge(&mut self, other: DependencyEdge) {
        self.dependency_type = self.dependency_type.merge(other.dependency_type);
        self.version_constraint = match (self.version_constraint.take(), other.version_constraint) {
            (Some(current), Some(incoming)) => Some(current.and(&incoming)),
            (current, incoming) => current.or(incoming),
        };
    }
}

impl From<&DeclaredDependency> for DependencyEdge {
    fn from(dependency: &DeclaredDependency) -> Self {
        Self {
            dependency_type: dependency.relation,
            version_constraint: dependency.version.clone(),
        }
    }
}
