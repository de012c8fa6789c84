//! Error message formatting with actionable suggestions.
//!
//! Sprout errors carry a suggestion; anything else reaching the binary edge
//! is printed with its cause chain.

use super::colors::ColorSupport;
use sprout_core::error::SproutError;
use std::error::Error;

/// Error formatter with suggestions
pub struct ErrorFormatter {
    colors: ColorSupport,
}

impl ErrorFormatter {
    /// Create a new error formatter
    pub fn new() -> Self {
        Self {
            colors: ColorSupport::detect(),
        }
    }

    #[cfg(test)]
    fn plain() -> Self {
        Self {
            colors: ColorSupport::disabled(),
        }
    }

    /// Format an error with its suggestion and source chain
    pub fn format_error(&self, error: &SproutError) -> String {
        let mut output = self.format_simple(&error.to_string());
        output.push('\n');

        if let Some(suggestion) = error.suggestion() {
            output.push('\n');
            output.push_str(&self.colors.dim("help"));
            output.push_str(": ");
            output.push_str(suggestion);
            output.push('\n');
        }

        self.push_causes(&mut output, error.source());
        output
    }

    /// Format an error from the binary edge, finding the Sprout error inside if any
    pub fn format_anyhow(&self, error: &anyhow::Error) -> String {
        if let Some(sprout) = error.chain().find_map(|cause| cause.downcast_ref::<SproutError>()) {
            let mut output = String::new();
            // Context added around the Sprout error comes first
            for context in error.chain().take_while(|cause| cause.downcast_ref::<SproutError>().is_none()) {
                output.push_str(&self.format_simple(&context.to_string()));
                output.push('\n');
            }
            output.push_str(&self.format_error(sprout));
            return output;
        }

        let mut output = self.format_simple(&error.to_string());
        self.push_causes(&mut output, error.source());
        output
    }

    /// Format a simple error message
    pub fn format_simple(&self, message: &str) -> String {
        format!("{}: {}", self.colors.red("error"), message)
    }

    /// Format a warning message
    pub fn format_warning(&self, message: &str) -> String {
        format!("{}: {}", self.colors.yellow("warning"), message)
    }

    fn push_causes(&self, output: &mut String, mut source: Option<&(dyn Error + 'static)>) {
        while let Some(err) = source {
            output.push('\n');
            output.push_str(&self.colors.dim("caused by"));
            output.push_str(": ");
            output.push_str(&err.to_string());
            source = err.source();
        }
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}
