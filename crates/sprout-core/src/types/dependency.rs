//! Declared dependency types.
//!
//! Defines the relation kinds a tool can declare towards another tool.

use super::VersionReq;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dependency declaration as found in a tool descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredDependency {
    /// Id of the tool depended upon
    #[serde(rename = "tool")]
    pub tool_id: String,
    /// Relation towards that tool
    #[serde(rename = "type", default)]
    pub relation: DependencyType,
    /// Optional version constraint the dependency must satisfy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionReq>,
}

/// Type of dependency relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    /// Must be installed before the dependent
    #[default]
    Required,
    /// May be installed; honoured only when optional dependencies are in scope
    Optional,
    /// Must not be installed alongside the dependent
    Conflicts,
    /// Advisory only
    Suggests,
}

impl DeclaredDependency {
    /// Create a required dependency
    pub fn required(tool_id: impl Into<String>) -> Self {
        Self::new(tool_id, DependencyType::Required)
    }

    /// Create an optional dependency
    pub fn optional(tool_id: impl Into<String>) -> Self {
        Self::new(tool_id, DependencyType::Optional)
    }

    /// Create a suggested dependency
    pub fn suggests(tool_id: impl Into<String>) -> Self {
        Self::new(tool_id, DependencyType::Suggests)
    }

    /// Declare that the tool cannot coexist with `tool_id`
    pub fn conflicts(tool_id: impl Into<String>) -> Self {
        Self::new(tool_id, DependencyType::Conflicts)
    }

    fn new(tool_id: impl Into<String>, relation: DependencyType) -> Self {
        Self {
            tool_id: tool_id.into(),
            relation,
            version: None,
        }
    }

    /// Attach a version constraint
    pub fn with_version(mut self, version: VersionReq) -> Self {
        self.version = Some(version);
        self
    }
}

impl DependencyType {
    /// Whether this relation asks for the target to be installed at all
    pub fn is_dependency(&self) -> bool {
        !matches!(self, DependencyType::Conflicts)
    }

    fn strength(&self) -> u8 {
        match self {
            DependencyType::Required => 3,
            DependencyType::Optional => 2,
            DependencyType::Suggests => 1,
            DependencyType::Conflicts => 0,
        }
    }

    /// Merge two relations declared for the same ordered pair.
    ///
    /// A conflict declaration always wins; otherwise the stronger relation is kept.
    pub fn merge(self, other: DependencyType) -> DependencyType {
        if self == DependencyType::Conflicts || other == DependencyType::Conflicts {
            DependencyType::Conflicts
        } else if other.strength() > self.strength() {
            other
        } else {
            self
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyType::Required => "required",
            DependencyType::Optional => "optional",
            DependencyType::Conflicts => "conflicts",
            DependencyType::Suggests => "suggests",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_creation() {
        let version_req = VersionReq::parse(">=16").unwrap();
        let dep = DeclaredDependency::required("node").with_version(version_req.clone());

        assert_eq!(dep.tool_id, "node");
        assert_eq!(dep.relation, DependencyType::Required);
        assert_eq!(dep.version, Some(version_req));
    }

    #[test]
    fn test_relation_merge() {
        use DependencyType::*;

        assert_eq!(Optional.merge(Required), Required);
        assert_eq!(Required.merge(Suggests), Required);
        assert_eq!(Suggests.merge(Optional), Optional);
        assert_eq!(Required.merge(Conflicts), Conflicts);
        assert_eq!(Conflicts.merge(Optional), Conflicts);
    }

    #[test]
    fn test_dependency_kinds() {
        assert!(DependencyType::Required.is_dependency());
        assert!(DependencyType::Suggests.is_dependency());
        assert!(!DependencyType::Conflicts.is_dependency());
    }

    #[test]
    fn test_declaration_deserializes_with_defaults() {
        let dep: DeclaredDependency = serde_json::from_str(r#"{"tool": "npm"}"#).unwrap();
        assert_eq!(dep.relation, DependencyType::Required);
        assert!(dep.version.is_none());

        let dep: DeclaredDependency =
            serde_json::from_str(r#"{"tool": "git", "type": "suggests", "version": ">=2.30"}"#)
                .unwrap();
        assert_eq!(dep.relation, DependencyType::Suggests);
        assert_eq!(dep.version.unwrap().to_string(), ">=2.30");
    }
}
