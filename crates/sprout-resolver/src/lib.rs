//! Dependency graph engine for Sprout
//!
//! This crate turns tool descriptors into a dependency graph, finds the
//! conflicts that would stop an installation, repairs what it can under a
//! resolution policy and produces an installation order split into batches
//! that can run in parallel.
//!
//! The pipeline is `build` -> `detect_conflicts` -> `resolve_conflicts` ->
//! `resolve_installation_order`. Every stage is synchronous and pure apart
//! from logging.

pub mod builder;
pub mod detect;
pub mod graph;
pub mod order;
pub mod resolve;
pub mod semver;

#[cfg(test)]
mod tests;

// Re-export main types
pub use builder::{build, BuildOptions, GraphConstructionResult};
pub use detect::{
    detect_conflicts, ConflictDetail, ConflictDetectionResult, ConflictType, DetectionOptions, Severity,
};
pub use graph::{DependencyEdge, GraphStatistics, PlatformSupport, ToolGraph, ToolNode};
pub use order::{
    plan_installation, plan_installation_with, resolve_installation_order, resolve_installation_order_with,
    InstallationOrder, OrderingOptions,
};
pub use resolve::{
    commit_plan, resolve_conflicts, revert_step, ExecutedResolutionStep, ResolutionExecutionResult,
    ResolutionPolicy, ResolutionStrategy, StepOutcome,
};

use sprout_core::error::SproutError;

/// Result type for resolver operations
pub type ResolverResult<T> = Result<T, SproutError>;
