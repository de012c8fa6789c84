//! Terminal color support detection and formatting.
//!
//! Colors are used only when both stdout and stderr are terminals and
//! `NO_COLOR` is unset, so piped JSON and reports stay free of escape codes.

use std::env;
use std::io::{self, IsTerminal};

const RESET: &str = "\x1b[0m";

/// Color support detection and formatting
pub struct ColorSupport {
    enabled: bool,
}

impl ColorSupport {
    /// Detect color support automatically
    pub fn detect() -> Self {
        Self {
            enabled: Self::should_use_colors(),
        }
    }

    /// Force disable colors
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    fn should_use_colors() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        io::stderr().is_terminal() && io::stdout().is_terminal()
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{}m{}{}", code, text, RESET)
        } else {
            text.to_string()
        }
    }

    pub fn green(&self, text: &str) -> String {
        self.paint("32", text)
    }

    pub fn yellow(&self, text: &str) -> String {
        self.paint("33", text)
    }

    pub fn red(&self, text: &str) -> String {
        self.paint("31", text)
    }

    pub fn bold(&self, text: &str) -> String {
        self.paint("1", text)
    }

    /// Dim/gray, used for secondary detail
    pub fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }
}
