//! Build log output
//!
//! Mirrors the indentation conventions of buildpack logs:
//!
//! ```text
//! Yarn Install 0.1.0                      <- title
//!   Resolving installation process        <- process
//!     Process inputs:                     <- subprocess
//!       yarn.lock -> Found                <- action
//! ```

use console::style;
use std::fmt::Display;

/// Writer for the user-facing build log
#[derive(Debug, Clone)]
pub struct BuildLog {
    enabled: bool,
}

impl BuildLog {
    /// Log to stdout
    pub fn new() -> Self {
        Self { enabled: true }
    }

    /// Discard everything (for tests and library use)
    pub fn silent() -> Self {
        Self { enabled: false }
    }

    fn line(&self, indent: usize, message: impl Display) {
        if self.enabled {
            println!("{:indent$}{}", "", message, indent = indent);
        }
    }

    /// Top-level heading
    pub fn title(&self, message: impl Display) {
        self.line(0, style(message).bold());
    }

    /// A phase of the build
    pub fn process(&self, message: impl Display) {
        self.line(2, message);
    }

    /// A step within a phase
    pub fn subprocess(&self, message: impl Display) {
        self.line(4, message);
    }

    /// A single observation or decision
    pub fn action(&self, message: impl Display) {
        self.line(6, message);
    }

    /// Something the user should look at
    pub fn warning(&self, message: impl Display) {
        self.line(6, style(message).yellow());
    }

    /// Blank separator line
    pub fn break_line(&self) {
        if self.enabled {
            println!();
        }
    }
}

impl Default for BuildLog {
    fn default() -> Self {
        Self::new()
    }
}
