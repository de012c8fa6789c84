//! # sprout-core
//!
//! Core types shared across all Sprout crates.
//!
//! This crate provides:
//! - Version, VersionReq and VersionRange types for constraint reasoning
//! - ToolDescriptor and related manifest types consumed by the graph builder
//! - SproutError enum for unified error handling
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (Version, ToolDescriptor, TargetPlatform, etc.)
//! - `error`: Error types and result aliases

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{SproutError, SproutResult};
pub use types::{
    Architecture, DeclaredDependency, DependencyType, InstallationMethod, InstallationStatus,
    OperatingSystem, TargetPlatform, ToolDescriptor, Version, VersionRange, VersionReq,
};
