//! Install command construction and execution
//!
//! ```text
//! yarn install --ignore-engines [--immutable] [--production false] [--modules-folder <layer>/node_modules]
//! ```
//!
//! - `--immutable` unless `enableImmutableInstalls: false`
//! - `--production false` for build-only installs; the launch install does
//!   the production-only pass
//! - `node_modules` linkers pin `--modules-folder` into the layer and get
//!   `<layer>/node_modules/.bin` prepended to `PATH`
//! - PnP gets `YARN_CACHE_FOLDER=<layer>/cache`

use crate::config::NODE_MODULES;
use crate::error::{YarnInstallError, YarnInstallResult};
use crate::install::executable::{Executable, Execution};
use crate::strategy::Strategy;
use crate::ui::BuildLog;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable pointing Yarn at its cache
pub const YARN_CACHE_FOLDER: &str = "YARN_CACHE_FOLDER";

/// Arguments to `yarn` for an install
pub fn install_args(strategy: &Strategy, layer_path: &Path, launch: bool) -> Vec<String> {
    let mut args = vec!["install".to_string(), "--ignore-engines".to_string()];

    let immutable = strategy
        .config
        .as_ref()
        .map_or(true, |config| config.immutable_installs());
    if immutable {
        args.push("--immutable".to_string());
    }

    if !launch {
        args.push("--production".to_string());
        args.push("false".to_string());
    }

    if strategy.uses_node_modules() {
        args.push("--modules-folder".to_string());
        args.push(layer_path.join(NODE_MODULES).to_string_lossy().into_owned());
    }

    args
}

/// Cache directory used by PnP installs
pub fn pnp_cache_dir(layer_path: &Path) -> PathBuf {
    layer_path.join("cache")
}

/// `PATH` with `dir` in front of `base`.
///
/// A `dir` that cannot appear in `PATH` (it contains the separator) leaves
/// `base` as it is.
fn prepend_path(dir: &Path, base: Option<&str>) -> String {
    let mut paths = vec![dir.to_path_buf()];
    if let Some(base) = base {
        paths.extend(std::env::split_paths(base));
    }
    match std::env::join_paths(paths) {
        Ok(joined) => joined.to_string_lossy().into_owned(),
        Err(e) => {
            warn!("Not adding {} to PATH: {}", dir.display(), e);
            match base {
                Some(base) => base.to_string(),
                None => String::new(),
            }
        }
    }
}

/// Runs `yarn install` for a strategy
pub struct InstallProcess<'a> {
    executable: &'a dyn Executable,
    log: &'a BuildLog,
    path: Option<String>,
}

impl<'a> InstallProcess<'a> {
    pub fn new(executable: &'a dyn Executable, log: &'a BuildLog) -> Self {
        Self {
            executable,
            log,
            path: None,
        }
    }

    /// `PATH` the child should see before the layer's bin dir is prepended
    pub fn with_path(mut self, path: Option<String>) -> Self {
        self.path = path;
        self
    }

    /// The full invocation for a strategy, without side effects
    pub fn execution(
        &self,
        project_dir: &Path,
        layer_path: &Path,
        launch: bool,
        strategy: &Strategy,
    ) -> Execution {
        let execution = Execution::new(install_args(strategy, layer_path, launch), project_dir);

        if strategy.uses_node_modules() {
            let bin = layer_path.join(NODE_MODULES).join(".bin");
            execution.with_env("PATH", prepend_path(&bin, self.path.as_deref()))
        } else {
            execution.with_env(
                YARN_CACHE_FOLDER,
                pnp_cache_dir(layer_path).to_string_lossy().into_owned(),
            )
        }
    }

    /// Run the install. Exactly one subprocess; failures are not retried.
    pub async fn run(
        &self,
        project_dir: &Path,
        layer_path: &Path,
        launch: bool,
        strategy: &Strategy,
    ) -> YarnInstallResult<()> {
        if !strategy.uses_node_modules() {
            let cache_dir = pnp_cache_dir(layer_path);
            tokio::fs::create_dir_all(&cache_dir).await.map_err(|e| {
                YarnInstallError::io(format!("creating cache directory {}", cache_dir.display()), e)
            })?;
        }

        let execution = self.execution(project_dir, layer_path, launch, strategy);
        let suffix = if strategy.uses_node_modules() { "" } else { " (PnP)" };
        self.log.subprocess(format!(
            "Running '{}'{}",
            self.executable.describe(&execution),
            suffix
        ));
        debug!("Install environment overrides: {:?}", execution.env);

        self.executable.execute(&execution).await?;
        Ok(())
    }
}
