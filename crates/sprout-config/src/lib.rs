//! Configuration loading for Sprout
//!
//! This crate handles parsing and layering of sprout.toml files and loading
//! of tool descriptor catalogs, providing one configuration value for the
//! CLI to run the dependency pipeline with.

pub mod catalog;
pub mod merge;
pub mod toml;

// Re-export main types
pub use catalog::{load_catalog, Catalog};
pub use merge::{ConfigLoader, ConfigSource, LoadedConfig};
pub use toml::{PlatformSection, SproutToml};

use sprout_core::error::SproutError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, SproutError>;
