//! Error types and result aliases for Sprout operations.
//!
//! Structural graph errors are fatal to the operation that raised them.
//! Conflicts found during detection are *not* errors; they are reported as data
//! by the resolver crate.

use thiserror::Error;

/// Unified error type for all Sprout operations
#[derive(Error, Debug)]
pub enum SproutError {
    // Graph structure errors
    #[error("Tool '{id}' is already present in the dependency graph")]
    DuplicateNode { id: String },

    #[error("Tool '{id}' is not present in the dependency graph")]
    UnknownNode { id: String },

    #[error("Tool '{id}' cannot depend on itself")]
    SelfDependency { id: String },

    #[error("Dependency graph would contain {count} tools, exceeding the limit of {limit}")]
    GraphTooLarge { count: usize, limit: usize },

    // Version errors
    #[error("Invalid version '{input}': {reason}")]
    InvalidVersion { input: String, reason: String },

    // Ordering errors
    #[error("Installation is blocked by {count} critical conflict(s): {conflicts}")]
    InstallationBlocked { count: usize, conflicts: String },

    // Resolution errors
    #[error("Resolution step '{action}' cannot be applied: {reason}")]
    ResolutionStep { action: String, reason: String },

    // Config errors
    #[error("Failed to parse {file}: {message}")]
    TomlParse { file: String, message: String },

    #[error("Failed to parse {file}: {message}")]
    JsonParse { file: String, message: String },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for Sprout operations
pub type SproutResult<T> = Result<T, SproutError>;

impl SproutError {
    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Shorthand for an unknown tool reference
    pub fn unknown_node(id: impl Into<String>) -> Self {
        Self::UnknownNode { id: id.into() }
    }

    /// Shorthand for a resolution step that cannot be applied or reverted
    pub fn resolution_step(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ResolutionStep {
            action: action.into(),
            reason: reason.into(),
        }
    }

    /// Check whether this error describes malformed graph input
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            SproutError::DuplicateNode { .. }
                | SproutError::UnknownNode { .. }
                | SproutError::SelfDependency { .. }
                | SproutError::GraphTooLarge { .. }
        )
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            SproutError::DuplicateNode { .. } => {
                Some("Each tool id may appear only once; remove or rename the duplicate descriptor")
            }
            SproutError::UnknownNode { .. } => {
                Some("Check the tool id spelling or add a descriptor for the missing tool")
            }
            SproutError::SelfDependency { .. } => {
                Some("Remove the dependency entry that points back at the same tool")
            }
            SproutError::GraphTooLarge { .. } => {
                Some("Request fewer tools or raise `build.max-nodes` in sprout.toml")
            }
            SproutError::InstallationBlocked { .. } => {
                Some("Run 'sprout resolve' to fix the conflicts before ordering the installation")
            }
            SproutError::ResolutionStep { .. } => {
                Some("Re-run 'sprout check' and plan the resolution against the current graph")
            }
            SproutError::InvalidVersion { .. } => {
                Some("Use versions like 1.2.3 and constraints like ^1.2, >=16 <20 or 18.x")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_classification() {
        assert!(SproutError::DuplicateNode { id: "node".into() }.is_structural());
        assert!(SproutError::unknown_node("npm").is_structural());
        assert!(SproutError::GraphTooLarge { count: 10, limit: 5 }.is_structural());
        assert!(!SproutError::ConfigValidation {
            field: "build.max-nodes".into(),
            reason: "must be positive".into(),
        }
        .is_structural());
    }

    #[test]
    fn test_error_messages_name_the_tool() {
        let err = SproutError::SelfDependency { id: "react".into() };
        assert!(err.to_string().contains("react"));
        assert!(err.suggestion().is_some());

        let err = SproutError::GraphTooLarge { count: 12, limit: 10 };
        assert!(err.to_string().contains("12"));
        assert!(err.to_string().contains("10"));
    }
}
