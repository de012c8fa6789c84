//! Core data types for Sprout.
//!
//! This module provides the fundamental types used throughout the workspace:
//! - Version types and constraint ranges
//! - Tool descriptors as supplied by the manifest layer
//! - Dependency relation kinds
//! - Target platform description

pub mod dependency;
pub mod descriptor;
pub mod platform;
pub mod version;

// Re-export all public types
pub use dependency::{DeclaredDependency, DependencyType};
pub use descriptor::{InstallationMethod, InstallationStatus, ToolDescriptor};
pub use platform::{Architecture, OperatingSystem, TargetPlatform};
pub use version::{Comparator, Op, PartialVersion, Version, VersionRange, VersionReq};
