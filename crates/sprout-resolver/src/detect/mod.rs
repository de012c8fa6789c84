//! Conflict detection
//!
//! Reads a graph plus the tools a user asked for and reports everything that
//! stands between them and a clean installation: dependency cycles, version
//! requirements that cannot all hold, tools without an installation path for
//! the target platform, and tools that declare they cannot coexist.
//!
//! Findings are data, not errors. The only failure is an unknown target id.

mod cycles;
mod platform;
mod versions;

pub use cycles::find_cycles;

use indexmap::IndexSet;
use petgraph::stable_graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info};

use sprout_core::types::VersionReq;

use crate::graph::{PlatformSupport, ToolGraph};
use crate::semver::{Compromise, ConstraintSolver};
use crate::ResolverResult;

/// Kind of conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictType {
    VersionConflict,
    CircularDependency,
    PlatformIncompatibility,
    ToolConflict,
}

/// Conflict severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Major,
    Critical,
}

/// How hard the detector looks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Thoroughness {
    /// Stop at the first finding per category
    Quick,
    /// Report every finding
    #[default]
    Balanced,
}

/// Options controlling detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DetectionOptions {
    /// Follow optional edges when computing the reachable set
    pub include_optional: bool,
    pub thoroughness: Thoroughness,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            include_optional: true,
            thoroughness: Thoroughness::Balanced,
        }
    }
}

/// Remedy family a conflict may be fixed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    VersionPinning,
    ToolSubstitution,
    EdgeRelaxation,
    FallbackInstallation,
}

/// A remedy the detector considers plausible
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedStrategy {
    pub strategy: StrategyKind,
    /// Confidence in [0, 1]
    pub confidence: f64,
    pub rationale: String,
}

/// One detected conflict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictDetail {
    /// Deterministic id, e.g. `version-conflict:node`
    pub id: String,
    pub conflict_type: ConflictType,
    pub severity: Severity,
    /// Tools involved, in a meaningful order for the conflict type
    pub tools: Vec<String>,
    pub blocks_installation: bool,
    pub auto_resolvable: bool,
    pub description: String,
    pub suggested_strategies: Vec<SuggestedStrategy>,
}

/// A constraint one tool places on another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRequirement {
    pub requirer: String,
    pub constraint: VersionReq,
}

/// Competing version requirements on one tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionConflict {
    pub tool: String,
    /// Requirements by ascending requirer id
    pub requirements: Vec<VersionRequirement>,
    pub severity: Severity,
    /// Best version found, satisfying the largest subset of requirements
    pub compromise: Option<Compromise>,
}

/// A dependency cycle, smallest id first
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CircularDependency {
    pub cycle: Vec<String>,
}

/// A reachable tool without a native installation path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformIncompatibility {
    pub tool: String,
    pub support: PlatformSupport,
}

/// Two reachable tools that declare they cannot coexist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConflict {
    /// Tool that declared the conflict
    pub tool: String,
    pub conflicts_with: String,
}

/// Aggregate numbers for a detection run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionStatistics {
    pub nodes_analyzed: usize,
    pub edges_analyzed: usize,
    pub version_conflicts: usize,
    pub circular_dependencies: usize,
    pub platform_incompatibilities: usize,
    pub tool_conflicts: usize,
    pub critical: usize,
    pub major: usize,
    pub minor: usize,
    pub elapsed_micros: u64,
}

/// Snapshot produced by [`detect_conflicts`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictDetectionResult {
    pub has_conflicts: bool,
    pub conflicts: Vec<ConflictDetail>,
    pub version_conflicts: Vec<VersionConflict>,
    pub circular_dependencies: Vec<CircularDependency>,
    pub platform_incompatibilities: Vec<PlatformIncompatibility>,
    pub tool_conflicts: Vec<ToolConflict>,
    /// Highest severity found
    pub severity: Option<Severity>,
    /// False iff a critical conflict exists
    pub can_proceed: bool,
    pub statistics: DetectionStatistics,
    /// Targets the detection ran for
    pub targets: Vec<String>,
    pub options: DetectionOptions,
}

/// Detect conflicts among the tools reachable from `targets`
pub fn detect_conflicts<S: AsRef<str>>(
    graph: &ToolGraph,
    targets: &[S],
    options: &DetectionOptions,
) -> ResolverResult<ConflictDetectionResult> {
    let started = Instant::now();
    let roots = graph.resolve_targets(targets)?;
    let reachable = graph.reachable_from(&roots, options.include_optional);
    let quick = options.thoroughness == Thoroughness::Quick;

    debug!(targets = roots.len(), reachable = reachable.len(), ?options, "detecting conflicts");

    let (circular_dependencies, cycle_details): (Vec<_>, Vec<_>) =
        cycles::detect(graph, &reachable, options.include_optional, quick)
            .into_iter()
            .unzip();
    let (version_conflicts, version_details): (Vec<_>, Vec<_>) =
        versions::detect(graph, &reachable, quick).into_iter().unzip();
    let (platform_incompatibilities, platform_details): (Vec<_>, Vec<_>) =
        platform::detect_platform(graph, &reachable, quick).into_iter().unzip();
    let (tool_conflicts, tool_details): (Vec<_>, Vec<_>) =
        platform::detect_tool_conflicts(graph, &reachable, quick).into_iter().unzip();

    let conflicts: Vec<ConflictDetail> = cycle_details
        .into_iter()
        .chain(version_details)
        .chain(platform_details)
        .chain(tool_details)
        .collect();

    for conflict in &conflicts {
        debug!(id = %conflict.id, severity = %conflict.severity, "conflict found");
    }

    let severity = conflicts.iter().map(|c| c.severity).max();
    let can_proceed = severity != Some(Severity::Critical);
    let count = |level: Severity| conflicts.iter().filter(|c| c.severity == level).count();

    let statistics = DetectionStatistics {
        nodes_analyzed: reachable.len(),
        edges_analyzed: reachable.iter().map(|index| graph.dependencies(*index).count()).sum(),
        version_conflicts: version_conflicts.len(),
        circular_dependencies: circular_dependencies.len(),
        platform_incompatibilities: platform_incompatibilities.len(),
        tool_conflicts: tool_conflicts.len(),
        critical: count(Severity::Critical),
        major: count(Severity::Major),
        minor: count(Severity::Minor),
        elapsed_micros: u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
    };

    info!(
        conflicts = conflicts.len(),
        critical = statistics.critical,
        can_proceed,
        "conflict detection finished"
    );

    Ok(ConflictDetectionResult {
        has_conflicts: !conflicts.is_empty(),
        conflicts,
        version_conflicts,
        circular_dependencies,
        platform_incompatibilities,
        tool_conflicts,
        severity,
        can_proceed,
        statistics,
        targets: roots.iter().map(|index| graph.id_of(*index).to_string()).collect(),
        options: options.clone(),
    })
}

/// Reachable nodes in ascending id order
fn sorted_by_id(graph: &ToolGraph, scope: &IndexSet<NodeIndex>) -> Vec<NodeIndex> {
    let mut nodes: Vec<NodeIndex> = scope.iter().copied().collect();
    nodes.sort_by(|a, b| graph.id_of(*a).cmp(graph.id_of(*b)));
    nodes
}

impl ConflictDetectionResult {
    pub fn conflict(&self, id: &str) -> Option<&ConflictDetail> {
        self.conflicts.iter().find(|conflict| conflict.id == id)
    }

    pub fn version_conflict(&self, tool: &str) -> Option<&VersionConflict> {
        self.version_conflicts.iter().find(|conflict| conflict.tool == tool)
    }

    pub fn critical_conflicts(&self) -> impl Iterator<Item = &ConflictDetail> {
        self.conflicts.iter().filter(|conflict| conflict.severity == Severity::Critical)
    }
}

impl VersionConflict {
    /// Solver over this conflict's requirements
    pub fn solver(&self) -> ConstraintSolver {
        let mut solver = ConstraintSolver::new();
        for requirement in &self.requirements {
            solver.add_constraint(requirement.requirer.clone(), requirement.constraint.clone());
        }
        solver
    }
}

impl CircularDependency {
    /// Edges of the cycle in order, ending with the edge that closes it
    pub fn edges(&self) -> Vec<(&str, &str)> {
        let len = self.cycle.len();
        (0..len)
            .map(|i| (self.cycle[i].as_str(), self.cycle[(i + 1) % len].as_str()))
            .collect()
    }

    /// Format cycle as "a -> b -> c -> a"
    pub fn display_path(&self) -> String {
        match self.cycle.first() {
            Some(first) => format!("{} -> {}", self.cycle.join(" -> "), first),
            None => "No cycle".to_string(),
        }
    }
}

impl SuggestedStrategy {
    pub fn new(strategy: StrategyKind, confidence: f64, rationale: impl Into<String>) -> Self {
        Self {
            strategy,
            confidence: confidence.clamp(0.0, 1.0),
            rationale: rationale.into(),
        }
    }
}

impl ConflictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::VersionConflict => "version-conflict",
            ConflictType::CircularDependency => "circular-dependency",
            ConflictType::PlatformIncompatibility => "platform-incompatibility",
            ConflictType::ToolConflict => "tool-conflict",
        }
    }
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::VersionPinning => "version-pinning",
            StrategyKind::ToolSubstitution => "tool-substitution",
            StrategyKind::EdgeRelaxation => "edge-relaxation",
            StrategyKind::FallbackInstallation => "fallback-installation",
        }
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Minor => "minor",
            Severity::Major => "major",
            Severity::Critical => "critical",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DependencyEdge;
    use sprout_core::error::SproutError;
    use sprout_core::types::{InstallationMethod, OperatingSystem, ToolDescriptor, Version};

    fn graph_with(ids: &[&str]) -> ToolGraph {
        let mut graph = ToolGraph::new();
        for id in ids {
            graph.add_node(ToolDescriptor::new(*id), None).unwrap();
        }
        graph
    }

    fn constrained(req: &str) -> DependencyEdge {
        DependencyEdge::required().with_constraint(VersionReq::parse(req).unwrap())
    }

    #[test]
    fn test_unknown_target() {
        let graph = graph_with(&["node"]);
        let result = detect_conflicts(&graph, &["deno"], &DetectionOptions::default());
        assert!(matches!(result, Err(SproutError::UnknownNode { ref id }) if id == "deno"));
    }

    #[test]
    fn test_clean_graph() {
        let mut graph = graph_with(&["react", "node", "npm"]);
        graph.add_edge("react", "node", constrained(">=16")).unwrap();
        graph.add_edge("react", "npm", DependencyEdge::required()).unwrap();

        let result = detect_conflicts(&graph, &["react"], &DetectionOptions::default()).unwrap();
        assert!(!result.has_conflicts);
        assert!(result.can_proceed);
        assert_eq!(result.severity, None);
        assert_eq!(result.statistics.nodes_analyzed, 3);
        assert_eq!(result.statistics.edges_analyzed, 2);
        assert_eq!(result.targets, vec!["react".to_string()]);
    }

    #[test]
    fn test_disjoint_cycles_all_reported() {
        let mut graph = graph_with(&["root", "a", "b", "x", "y", "z"]);
        for (from, to) in [("root", "a"), ("a", "b"), ("b", "a"), ("root", "x"), ("x", "y"), ("y", "z"), ("z", "x")] {
            graph.add_edge(from, to, DependencyEdge::required()).unwrap();
        }

        let result = detect_conflicts(&graph, &["root"], &DetectionOptions::default()).unwrap();
        let cycles: Vec<Vec<String>> = result.circular_dependencies.iter().map(|c| c.cycle.clone()).collect();
        assert_eq!(
            cycles,
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["x".to_string(), "y".to_string(), "z".to_string()],
            ]
        );
        assert!(!result.can_proceed);
        assert!(result.conflict("circular-dependency:x->y->z").is_some());

        let quick = DetectionOptions {
            thoroughness: Thoroughness::Quick,
            ..Default::default()
        };
        let result = detect_conflicts(&graph, &["root"], &quick).unwrap();
        assert_eq!(result.circular_dependencies.len(), 1);
    }

    #[test]
    fn test_optional_cycles_respect_options() {
        let mut graph = graph_with(&["a", "b"]);
        graph.add_edge("a", "b", DependencyEdge::required()).unwrap();
        graph.add_edge("b", "a", DependencyEdge::optional()).unwrap();

        let with_optional = detect_conflicts(&graph, &["a"], &DetectionOptions::default()).unwrap();
        assert_eq!(with_optional.circular_dependencies.len(), 1);

        let required_only = DetectionOptions {
            include_optional: false,
            ..Default::default()
        };
        let result = detect_conflicts(&graph, &["a"], &required_only).unwrap();
        assert!(result.circular_dependencies.is_empty());
    }

    #[test]
    fn test_unsatisfiable_versions_are_critical() {
        let mut graph = graph_with(&["app", "tool-a", "tool-b", "node"]);
        graph.add_edge("app", "tool-a", DependencyEdge::required()).unwrap();
        graph.add_edge("app", "tool-b", DependencyEdge::required()).unwrap();
        graph.add_edge("tool-a", "node", constrained("16.x")).unwrap();
        graph.add_edge("tool-b", "node", constrained(">=18")).unwrap();

        let result = detect_conflicts(&graph, &["app"], &DetectionOptions::default()).unwrap();
        assert_eq!(result.version_conflicts.len(), 1);

        let conflict = &result.version_conflicts[0];
        assert_eq!(conflict.severity, Severity::Critical);
        assert_eq!(conflict.requirements[0].requirer, "tool-a");
        let compromise = conflict.compromise.as_ref().unwrap();
        assert_eq!(compromise.version, Version::new(18, 0, 0));

        let detail = result.conflict("version-conflict:node").unwrap();
        assert!(detail.blocks_installation);
        assert!(detail.auto_resolvable);
        assert!(!result.can_proceed);
    }

    #[test]
    fn test_overlap_outside_known_releases_is_major() {
        let mut graph = ToolGraph::new();
        graph
            .add_node(
                ToolDescriptor::new("python").with_versions([Version::new(3, 10, 0), Version::new(3, 12, 0)]),
                None,
            )
            .unwrap();
        graph.add_node(ToolDescriptor::new("a"), None).unwrap();
        graph.add_node(ToolDescriptor::new("b"), None).unwrap();
        graph.add_edge("a", "python", constrained(">=3.11")).unwrap();
        graph.add_edge("b", "python", constrained("<3.12")).unwrap();

        let result = detect_conflicts(&graph, &["a", "b"], &DetectionOptions::default()).unwrap();
        assert_eq!(result.severity, Some(Severity::Major));
        assert!(result.can_proceed);
        assert!(!result.conflicts[0].blocks_installation);
    }

    #[test]
    fn test_platform_findings() {
        let mut graph = graph_with(&["app", "emulated", "missing"]);
        graph.add_edge("app", "emulated", DependencyEdge::required()).unwrap();
        graph.add_edge("app", "missing", DependencyEdge::required()).unwrap();
        graph
            .set_platform_support(
                "emulated",
                Some(PlatformSupport::Fallback {
                    method: InstallationMethod::for_os("pkg", OperatingSystem::Macos),
                    accepted: false,
                }),
            )
            .unwrap();
        graph
            .set_platform_support(
                "missing",
                Some(PlatformSupport::Unsupported {
                    reason: "no method".to_string(),
                }),
            )
            .unwrap();

        let result = detect_conflicts(&graph, &["app"], &DetectionOptions::default()).unwrap();
        assert_eq!(result.platform_incompatibilities.len(), 2);

        let emulated = result.conflict("platform-incompatibility:emulated").unwrap();
        assert_eq!(emulated.severity, Severity::Minor);
        assert!(!emulated.blocks_installation);

        let missing = result.conflict("platform-incompatibility:missing").unwrap();
        assert_eq!(missing.severity, Severity::Major);
        assert!(missing.blocks_installation);
        assert!(result.can_proceed);
    }

    #[test]
    fn test_tool_conflicts_between_reachable_tools() {
        let mut graph = graph_with(&["app", "yarn", "pnpm", "bun"]);
        graph.add_edge("app", "yarn", DependencyEdge::required()).unwrap();
        graph.add_edge("app", "pnpm", DependencyEdge::required()).unwrap();
        graph.add_edge("yarn", "pnpm", DependencyEdge::conflicts()).unwrap();
        graph.add_edge("pnpm", "yarn", DependencyEdge::conflicts()).unwrap();
        graph.add_edge("yarn", "bun", DependencyEdge::conflicts()).unwrap();

        let result = detect_conflicts(&graph, &["app"], &DetectionOptions::default()).unwrap();
        assert_eq!(result.tool_conflicts.len(), 1);
        assert!(result.conflict("tool-conflict:pnpm:yarn").is_some());
    }

    #[test]
    fn test_cycle_display() {
        let cycle = CircularDependency {
            cycle: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        };
        assert_eq!(cycle.display_path(), "a -> b -> c -> a");
        assert_eq!(cycle.edges().last(), Some(&("c", "a")));
    }
}
