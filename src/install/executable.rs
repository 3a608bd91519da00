//! Subprocess seam
//!
//! The engine never touches the process-wide environment. Each invocation
//! carries its own overrides, which are layered on top of the inherited
//! environment of the child only.

use crate::error::{YarnInstallError, YarnInstallResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Where the child's stdout/stderr go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Forward to our own stdout/stderr (the build log)
    Stream,
    /// Collect stdout followed by stderr and return it
    Capture,
}

/// A single invocation of an executable
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// Arguments, not including the program name
    pub args: Vec<String>,
    /// Environment overrides for this child only
    pub env: BTreeMap<String, String>,
    /// Working directory
    pub dir: PathBuf,
    pub output: OutputMode,
}

impl Execution {
    /// Streamed execution with no environment overrides
    pub fn new(args: Vec<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            args,
            env: BTreeMap::new(),
            dir: dir.into(),
            output: OutputMode::Stream,
        }
    }

    /// Capture output instead of streaming it
    pub fn captured(mut self) -> Self {
        self.output = OutputMode::Capture;
        self
    }

    /// Add an environment override
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// Something that can run a package-manager command
#[async_trait]
pub trait Executable: Send + Sync {
    /// Program name for logs and errors
    fn name(&self) -> &str;

    /// Run to completion. Returns captured output (empty when streamed).
    ///
    /// Fails when the program cannot be started or exits nonzero.
    async fn execute(&self, execution: &Execution) -> YarnInstallResult<Vec<u8>>;

    /// Human-readable command line for an execution
    fn describe(&self, execution: &Execution) -> String {
        if execution.args.is_empty() {
            self.name().to_string()
        } else {
            format!("{} {}", self.name(), execution.args.join(" "))
        }
    }
}

/// The `yarn` binary (or a stand-in at a custom path)
#[derive(Debug, Clone)]
pub struct YarnExecutable {
    program: PathBuf,
    name: String,
}

impl YarnExecutable {
    /// Use `yarn` from PATH
    pub fn new() -> Self {
        Self::with_program("yarn")
    }

    /// Use a specific program
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let name = program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "yarn".to_string());
        Self { program, name }
    }
}

impl Default for YarnExecutable {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Executable for YarnExecutable {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, execution: &Execution) -> YarnInstallResult<Vec<u8>> {
        let description = self.describe(execution);
        debug!("Executing: {} (in {})", description, execution.dir.display());

        let mut command = Command::new(&self.program);
        command
            .args(&execution.args)
            .envs(&execution.env)
            .current_dir(&execution.dir)
            .stdin(Stdio::null());

        match execution.output {
            OutputMode::Stream => {
                let status = command
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .status()
                    .await
                    .map_err(|e| YarnInstallError::command_failed(description.clone(), e))?;

                if !status.success() {
                    return Err(YarnInstallError::command_exit(description, status.code()));
                }
                Ok(Vec::new())
            }
            OutputMode::Capture => {
                let output = command
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .output()
                    .await
                    .map_err(|e| YarnInstallError::command_failed(description.clone(), e))?;

                if !output.status.success() {
                    return Err(YarnInstallError::command_exit(
                        description,
                        output.status.code(),
                    ));
                }

                let mut combined = output.stdout;
                combined.extend_from_slice(&output.stderr);
                Ok(combined)
            }
        }
    }
}
