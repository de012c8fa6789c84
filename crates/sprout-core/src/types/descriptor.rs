//! Tool descriptor types.
//!
//! Descriptors are supplied by the manifest layer; their schema is validated
//! there. The graph builder only relies on the structure defined here.

use super::{Architecture, DeclaredDependency, OperatingSystem, Version};
use serde::{Deserialize, Serialize};

/// Manifest data for one installable tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Stable unique identifier (e.g. "node")
    pub id: String,
    /// Human readable name, defaults to the id
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Free-form category ("runtime", "editor", ...)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,
    /// Supported operating systems; empty means all
    #[serde(default)]
    pub platforms: Vec<OperatingSystem>,
    /// Supported architectures; empty means all
    #[serde(default)]
    pub architectures: Vec<Architecture>,
    /// Ways of installing the tool
    #[serde(default)]
    pub installation_methods: Vec<InstallationMethod>,
    /// Declared dependency relations
    #[serde(default)]
    pub dependencies: Vec<DeclaredDependency>,
    /// Known release versions
    #[serde(default)]
    pub versions: Vec<Version>,
    /// Tool ids that can stand in for this tool
    #[serde(default)]
    pub alternatives: Vec<String>,
}

/// One way of installing a tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationMethod {
    /// Method name ("apt", "brew", "installer", ...)
    pub name: String,
    /// Operating system the method targets; `None` for cross-platform methods
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<OperatingSystem>,
    /// Architectures the method ships binaries for; empty means all
    #[serde(default)]
    pub architectures: Vec<Architecture>,
    /// Command handed to the installation layer
    #[serde(default)]
    pub command: String,
    /// Lower value wins when several methods match
    #[serde(default)]
    pub priority: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_version: Option<Version>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_version: Option<Version>,
}

/// Whether a tool is already present on the target system
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InstallationStatus {
    pub installed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
}

impl ToolDescriptor {
    /// Create a descriptor with only an id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            category: String::new(),
            platforms: Vec::new(),
            architectures: Vec::new(),
            installation_methods: Vec::new(),
            dependencies: Vec::new(),
            versions: Vec::new(),
            alternatives: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_dependency(mut self, dependency: DeclaredDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn with_method(mut self, method: InstallationMethod) -> Self {
        self.installation_methods.push(method);
        self
    }

    pub fn with_versions(mut self, versions: impl IntoIterator<Item = Version>) -> Self {
        self.versions.extend(versions);
        self
    }

    pub fn with_alternative(mut self, tool_id: impl Into<String>) -> Self {
        self.alternatives.push(tool_id.into());
        self
    }

    pub fn with_platforms(mut self, platforms: impl IntoIterator<Item = OperatingSystem>) -> Self {
        self.platforms.extend(platforms);
        self
    }

    /// Display name, falling back to the id
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Whether the descriptor restricts itself away from `os`
    pub fn excludes_os(&self, os: OperatingSystem) -> bool {
        !self.platforms.is_empty() && !self.platforms.contains(&os)
    }

    /// Whether the descriptor restricts itself away from `arch`
    pub fn excludes_arch(&self, arch: Architecture) -> bool {
        !self.architectures.is_empty() && !self.architectures.contains(&arch)
    }
}

impl InstallationMethod {
    /// Method targeting a specific operating system
    pub fn for_os(name: impl Into<String>, os: OperatingSystem) -> Self {
        Self::new(name, Some(os))
    }

    /// Method that works on every operating system
    pub fn cross_platform(name: impl Into<String>) -> Self {
        Self::new(name, None)
    }

    fn new(name: impl Into<String>, os: Option<OperatingSystem>) -> Self {
        Self {
            name: name.into(),
            os,
            architectures: Vec::new(),
            command: String::new(),
            priority: 0,
            min_version: None,
            max_version: None,
        }
    }

    pub fn with_arch(mut self, arch: Architecture) -> Self {
        self.architectures.push(arch);
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_version_bounds(mut self, min: Option<Version>, max: Option<Version>) -> Self {
        self.min_version = min;
        self.max_version = max;
        self
    }

    /// Whether the method can be used on `os` at all
    pub fn targets_os(&self, os: OperatingSystem) -> bool {
        self.os.map_or(true, |method_os| method_os == os)
    }

    /// Whether the method ships a binary for `arch`
    pub fn ships_for(&self, arch: Architecture) -> bool {
        self.architectures.is_empty() || self.architectures.contains(&arch)
    }
}

impl InstallationStatus {
    pub fn not_installed() -> Self {
        Self::default()
    }

    pub fn installed(version: Option<Version>) -> Self {
        Self {
            installed: true,
            version,
        }
    }
}
