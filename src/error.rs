//! Error types for yarn-install
//!
//! All modules use `YarnInstallResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for yarn-install operations
pub type YarnInstallResult<T> = Result<T, YarnInstallError>;

/// All errors that can occur while deciding, staging or running an install
#[derive(Error, Debug)]
pub enum YarnInstallError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // Detection errors
    #[error("{0}")]
    DetectFailed(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed to start: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command exited unsuccessfully: {command}, exit code: {code}")]
    CommandExit { command: String, code: i32 },

    // Serialization errors
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("{0}")]
    User(String),
}

impl YarnInstallError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command launch failure
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a nonzero exit failure. Signal termination reports code -1.
    pub fn command_exit(command: impl Into<String>, code: Option<i32>) -> Self {
        Self::CommandExit {
            command: command.into(),
            code: code.unwrap_or(-1),
        }
    }

    /// Whether this error means detection did not pass rather than broke
    pub fn is_detect_failure(&self) -> bool {
        matches!(self, Self::DetectFailed(_))
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ConfigInvalid { .. } => Some("Fix the syntax of the file named above"),
            Self::CommandFailed { .. } => Some("Make sure yarn is installed and on PATH"),
            Self::CommandExit { .. } => Some("See the yarn output above for details"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = YarnInstallError::command_exit("yarn install", Some(2));
        assert!(err.to_string().contains("exit code: 2"));
    }

    #[test]
    fn signal_exit_reports_negative_code() {
        let err = YarnInstallError::command_exit("yarn install", None);
        assert!(matches!(err, YarnInstallError::CommandExit { code: -1, .. }));
    }

    #[test]
    fn error_hint() {
        let err = YarnInstallError::ConfigInvalid {
            path: PathBuf::from(".yarnrc.yml"),
            reason: "bad".to_string(),
        };
        assert_eq!(err.hint(), Some("Fix the syntax of the file named above"));
        assert_eq!(YarnInstallError::User("x".to_string()).hint(), None);
    }

    #[test]
    fn detect_failure_is_distinguished() {
        assert!(YarnInstallError::DetectFailed("no yarn.lock".to_string()).is_detect_failure());
        assert!(!YarnInstallError::User("x".to_string()).is_detect_failure());
    }
}
