//! Graph construction from tool descriptors
//!
//! The builder turns an ordered descriptor collection into a [`ToolGraph`],
//! applies the inclusion policy for optional and suggested dependencies and
//! selects an installation method per tool for the target platform. It never
//! judges the result: platform gaps are recorded on the node and reported by
//! the detector.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use sprout_core::error::SproutError;
use sprout_core::types::{DependencyType, InstallationMethod, TargetPlatform, ToolDescriptor};

use crate::graph::{DependencyEdge, PlatformSupport, ToolGraph};
use crate::ResolverResult;

/// Options controlling graph construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildOptions {
    /// Turn optional dependency declarations into edges
    pub include_optional: bool,
    /// Turn suggested dependency declarations into edges
    pub include_suggested: bool,
    /// Upper bound on unique descriptors
    pub max_nodes: usize,
    /// Reject structurally broken input instead of building around it
    pub validate_during_construction: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            include_optional: true,
            include_suggested: false,
            max_nodes: 1000,
            validate_during_construction: true,
        }
    }
}

/// Outcome of a build
#[derive(Debug)]
pub struct GraphConstructionResult {
    /// The graph, absent when validation found structural errors
    pub graph: Option<ToolGraph>,
    /// Structural errors found by validation
    pub errors: Vec<SproutError>,
    /// Problems that were skipped over
    pub warnings: Vec<String>,
}

impl GraphConstructionResult {
    pub fn is_valid(&self) -> bool {
        self.graph.is_some() && self.errors.is_empty()
    }
}

/// Build a graph from descriptors for `platform`
///
/// Fails with `GraphTooLarge` when there are more unique descriptors than
/// `options.max_nodes`.
pub fn build(
    descriptors: &[ToolDescriptor],
    platform: TargetPlatform,
    options: &BuildOptions,
) -> ResolverResult<GraphConstructionResult> {
    let unique: IndexSet<&str> = descriptors.iter().map(|d| d.id.as_str()).collect();
    if unique.len() > options.max_nodes {
        warn!(count = unique.len(), limit = options.max_nodes, "descriptor set exceeds node limit");
        return Err(SproutError::GraphTooLarge {
            count: unique.len(),
            limit: options.max_nodes,
        });
    }

    let mut warnings = Vec::new();

    if options.validate_during_construction {
        let errors = validate(descriptors, &unique, options);
        if !errors.is_empty() {
            warn!(errors = errors.len(), "descriptor validation failed");
            return Ok(GraphConstructionResult {
                graph: None,
                errors,
                warnings,
            });
        }
    }

    let mut graph = ToolGraph::new();
    let mut accepted = Vec::with_capacity(unique.len());

    for descriptor in descriptors {
        if graph.contains(&descriptor.id) {
            warnings.push(format!("duplicate descriptor '{}' ignored", descriptor.id));
            continue;
        }
        graph.add_node(descriptor.clone(), None)?;
        graph.set_platform_support(&descriptor.id, select_method(descriptor, platform))?;
        accepted.push(descriptor);
    }

    for descriptor in accepted {
        for dependency in &descriptor.dependencies {
            if !is_included(dependency.relation, options) {
                debug!(tool = %descriptor.id, dependency = %dependency.tool_id, relation = %dependency.relation, "dependency excluded by policy");
                continue;
            }
            if dependency.tool_id == descriptor.id {
                warnings.push(format!("'{}' declares a dependency on itself; skipped", descriptor.id));
                continue;
            }
            if !graph.contains(&dependency.tool_id) {
                warnings.push(format!(
                    "'{}' references unknown tool '{}' ({}); edge skipped",
                    descriptor.id, dependency.tool_id, dependency.relation
                ));
                continue;
            }
            graph.add_edge(&descriptor.id, &dependency.tool_id, DependencyEdge::from(dependency))?;
        }
    }

    for warning in &warnings {
        warn!("{}", warning);
    }
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        warnings = warnings.len(),
        %platform,
        "dependency graph built"
    );

    Ok(GraphConstructionResult {
        graph: Some(graph),
        errors: Vec::new(),
        warnings,
    })
}

fn is_included(relation: DependencyType, options: &BuildOptions) -> bool {
    match relation {
        DependencyType::Required | DependencyType::Conflicts => true,
        DependencyType::Optional => options.include_optional,
        DependencyType::Suggests => options.include_suggested,
    }
}

/// Structural pre-check: duplicate ids, self-dependencies and required
/// dependencies on tools that are not in the collection
fn validate(descriptors: &[ToolDescriptor], known: &IndexSet<&str>, options: &BuildOptions) -> Vec<SproutError> {
    let mut errors = Vec::new();
    let mut seen = IndexSet::new();

    for descriptor in descriptors {
        if !seen.insert(descriptor.id.as_str()) {
            errors.push(SproutError::DuplicateNode {
                id: descriptor.id.clone(),
            });
        }

        for dependency in &descriptor.dependencies {
            if !is_included(dependency.relation, options) {
                continue;
            }
            if dependency.tool_id == descriptor.id {
                errors.push(SproutError::SelfDependency {
                    id: descriptor.id.clone(),
                });
            } else if dependency.relation == DependencyType::Required
                && !known.contains(dependency.tool_id.as_str())
            {
                errors.push(SproutError::unknown_node(dependency.tool_id.clone()));
            }
        }
    }

    errors
}

/// Pick the installation method for `descriptor` on `platform`
///
/// Returns `None` for descriptors that declare neither methods nor platform
/// restrictions; their installation path is left to the execution layer.
pub fn select_method(descriptor: &ToolDescriptor, platform: TargetPlatform) -> Option<PlatformSupport> {
    if descriptor.excludes_os(platform.os) {
        return Some(PlatformSupport::Unsupported {
            reason: format!("{} is not available on {}", descriptor.id, platform.os),
        });
    }

    if descriptor.installation_methods.is_empty() {
        if descriptor.excludes_arch(platform.arch)
            && !descriptor.architectures.iter().any(|arch| platform.can_run(*arch))
        {
            return Some(PlatformSupport::Unsupported {
                reason: format!("{} is not built for {}", descriptor.id, platform.arch),
            });
        }
        return None;
    }

    let native_arch = !descriptor.excludes_arch(platform.arch);
    let native = descriptor
        .installation_methods
        .iter()
        .filter(|method| native_arch && method.targets_os(platform.os) && method.ships_for(platform.arch))
        .min_by_key(|method| method.priority);
    if let Some(method) = native {
        return Some(PlatformSupport::Native { method: method.clone() });
    }

    let fallback = descriptor
        .installation_methods
        .iter()
        .filter(|method| method.targets_os(platform.os) && runs_emulated(method, descriptor, platform))
        .min_by_key(|method| method.priority);
    if let Some(method) = fallback {
        debug!(tool = %descriptor.id, method = %method.name, "only an emulated method is available");
        return Some(PlatformSupport::Fallback {
            method: method.clone(),
            accepted: false,
        });
    }

    Some(PlatformSupport::Unsupported {
        reason: format!("no installation method for {} on {}", descriptor.id, platform),
    })
}

fn runs_emulated(method: &InstallationMethod, descriptor: &ToolDescriptor, platform: TargetPlatform) -> bool {
    let arches = if method.architectures.is_empty() {
        &descriptor.architectures
    } else {
        &method.architectures
    };
    arches.iter().any(|arch| *arch != platform.arch && platform.can_run(*arch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprout_core::types::{Architecture, DeclaredDependency, OperatingSystem, VersionReq};

    fn linux_x64() -> TargetPlatform {
        TargetPlatform::new(OperatingSystem::Linux, Architecture::X64)
    }

    fn mac_arm() -> TargetPlatform {
        TargetPlatform::new(OperatingSystem::Macos, Architecture::Arm64)
    }

    fn web_stack() -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor::new("node"),
            ToolDescriptor::new("npm"),
            ToolDescriptor::new("react")
                .with_dependency(DeclaredDependency::required("node").with_version(VersionReq::parse(">=16").unwrap()))
                .with_dependency(DeclaredDependency::required("npm"))
                .with_dependency(DeclaredDependency::optional("typescript"))
                .with_dependency(DeclaredDependency::suggests("eslint")),
            ToolDescriptor::new("typescript"),
            ToolDescriptor::new("eslint"),
        ]
    }

    #[test]
    fn test_build_applies_inclusion_policy() {
        let result = build(&web_stack(), linux_x64(), &BuildOptions::default()).unwrap();
        let graph = result.graph.unwrap();

        assert_eq!(graph.node_count(), 5);
        assert!(graph.edge("react", "typescript").is_some());
        assert!(graph.edge("react", "eslint").is_none());

        let options = BuildOptions {
            include_optional: false,
            include_suggested: true,
            ..Default::default()
        };
        let graph = build(&web_stack(), linux_x64(), &options).unwrap().graph.unwrap();
        assert!(graph.edge("react", "typescript").is_none());
        assert!(graph.edge("react", "eslint").is_some());
    }

    #[test]
    fn test_unknown_optional_reference_is_a_warning() {
        let descriptors = vec![ToolDescriptor::new("vim").with_dependency(DeclaredDependency::optional("ctags"))];
        let result = build(&descriptors, linux_x64(), &BuildOptions::default()).unwrap();

        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("ctags"));
    }

    #[test]
    fn test_validation_rejects_structural_errors() {
        let descriptors = vec![
            ToolDescriptor::new("git"),
            ToolDescriptor::new("git"),
            ToolDescriptor::new("hub").with_dependency(DeclaredDependency::required("gh")),
            ToolDescriptor::new("loop").with_dependency(DeclaredDependency::required("loop")),
        ];
        let result = build(&descriptors, linux_x64(), &BuildOptions::default()).unwrap();

        assert!(result.graph.is_none());
        assert_eq!(result.errors.len(), 3);
        assert!(matches!(result.errors[0], SproutError::DuplicateNode { .. }));
        assert!(matches!(result.errors[1], SproutError::UnknownNode { ref id } if id == "gh"));
        assert!(matches!(result.errors[2], SproutError::SelfDependency { .. }));
    }

    #[test]
    fn test_without_validation_problems_become_warnings() {
        let descriptors = vec![
            ToolDescriptor::new("git").with_category("vcs"),
            ToolDescriptor::new("git").with_category("other"),
            ToolDescriptor::new("hub").with_dependency(DeclaredDependency::required("gh")),
        ];
        let options = BuildOptions {
            validate_during_construction: false,
            ..Default::default()
        };
        let result = build(&descriptors, linux_x64(), &options).unwrap();
        let graph = result.graph.unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.node("git").unwrap().descriptor.category, "vcs");
        assert_eq!(result.warnings.len(), 2);
    }

    #[test]
    fn test_node_limit() {
        let descriptors: Vec<ToolDescriptor> = (0..5).map(|i| ToolDescriptor::new(format!("tool{}", i))).collect();
        let options = BuildOptions {
            max_nodes: 4,
            ..Default::default()
        };

        let result = build(&descriptors, linux_x64(), &options);
        assert!(matches!(result, Err(SproutError::GraphTooLarge { count: 5, limit: 4 })));
    }

    #[test]
    fn test_method_selection_prefers_native_then_priority() {
        let descriptor = ToolDescriptor::new("python")
            .with_method(InstallationMethod::for_os("winget", OperatingSystem::Windows))
            .with_method(InstallationMethod::for_os("apt", OperatingSystem::Linux).with_priority(2))
            .with_method(InstallationMethod::cross_platform("pyenv").with_priority(1))
            .with_method(InstallationMethod::for_os("dnf", OperatingSystem::Linux).with_priority(1));

        match select_method(&descriptor, linux_x64()) {
            Some(PlatformSupport::Native { method }) => assert_eq!(method.name, "pyenv"),
            other => panic!("expected native method, got {:?}", other),
        }
    }

    #[test]
    fn test_method_selection_falls_back_to_emulation() {
        let descriptor = ToolDescriptor::new("legacy-tool").with_method(
            InstallationMethod::for_os("pkg", OperatingSystem::Macos).with_arch(Architecture::X64),
        );

        assert!(matches!(
            select_method(&descriptor, mac_arm()),
            Some(PlatformSupport::Fallback { accepted: false, .. })
        ));

        let linux_arm = TargetPlatform::new(OperatingSystem::Linux, Architecture::Arm64);
        let descriptor = ToolDescriptor::new("legacy-tool").with_method(
            InstallationMethod::for_os("deb", OperatingSystem::Linux).with_arch(Architecture::X64),
        );
        assert!(matches!(
            select_method(&descriptor, linux_arm),
            Some(PlatformSupport::Unsupported { .. })
        ));
    }

    #[test]
    fn test_platform_restricted_tool_is_kept_but_unsupported() {
        let descriptors = vec![ToolDescriptor::new("xcode")
            .with_platforms([OperatingSystem::Macos])
            .with_method(InstallationMethod::for_os("app-store", OperatingSystem::Macos))];
        let graph = build(&descriptors, linux_x64(), &BuildOptions::default())
            .unwrap()
            .graph
            .unwrap();

        let node = graph.node("xcode").unwrap();
        assert!(matches!(node.platform_support, Some(PlatformSupport::Unsupported { .. })));
    }

    #[test]
    fn test_tools_without_methods_are_not_evaluated() {
        assert!(select_method(&ToolDescriptor::new("node"), linux_x64()).is_none());
    }
}
