//! Terminal output formatting and utilities.
//!
//! This module provides consistent output formatting across all commands,
//! including colors and error messages.

pub mod colors;
pub mod errors;

use sprout_resolver::Severity;

/// Output handler for consistent terminal formatting
pub struct OutputHandler {
    colors: colors::ColorSupport,
}

impl OutputHandler {
    /// Create a new output handler
    pub fn new() -> Self {
        Self {
            colors: colors::ColorSupport::detect(),
        }
    }

    /// Create an output handler that never emits escape codes
    pub fn plain() -> Self {
        Self {
            colors: colors::ColorSupport::disabled(),
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        println!("{}", self.colors.dim(message));
    }

    /// Print a section heading
    pub fn heading(&self, message: &str) {
        println!("{}", self.colors.bold(message));
    }

    /// Print an indented list entry
    pub fn item(&self, message: &str) {
        println!("  {}", message);
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        println!("{} {}", self.colors.green("✓"), message);
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        println!("{} {}", self.colors.yellow("⚠"), message);
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", self.colors.red("✗"), message);
    }

    /// Severity label colored by how bad it is
    pub fn severity(&self, severity: Severity) -> String {
        let label = severity.to_string();
        match severity {
            Severity::Critical => self.colors.red(&label),
            Severity::Major => self.colors.yellow(&label),
            Severity::Minor => self.colors.dim(&label),
        }
    }

    /// Print any serializable value as pretty JSON
    pub fn json<T: serde::Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}
