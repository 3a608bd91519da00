//! Cache validity decisions
//!
//! Decides once per layer whether `yarn install` has to run.
//!
//! | `yarn.lock` | Linking mode     | Rule                                              |
//! |-------------|------------------|---------------------------------------------------|
//! | missing     | any              | run, no fingerprint yet                           |
//! | present     | node_modules     | run unless the fingerprint matches `cache_sha`    |
//! | present     | pnp              | skip only if `.yarnrc.yml`, `.pnp.cjs` and cache exist |
//!
//! A failing `yarn info` probe never fails the build; it forces a run.

use crate::cache::fingerprint::{self, Fingerprint};
use crate::cache::metadata::CacheMetadata;
use crate::error::YarnInstallResult;
use crate::install::{Execution, Executable};
use crate::strategy::{probe, Strategy};
use crate::ui::BuildLog;
use std::path::Path;
use tracing::{debug, warn};

/// Outcome of a cache check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Install must run. A fingerprint is present only when one should be
    /// recorded after the install succeeds.
    MustRun(Option<Fingerprint>),
    /// The layer is valid as-is; its metadata must be left untouched
    CanSkip,
}

impl Decision {
    pub fn should_run(&self) -> bool {
        matches!(self, Self::MustRun(_))
    }

    /// New fingerprint to persist after a successful install
    pub fn fingerprint(&self) -> Option<&Fingerprint> {
        match self {
            Self::MustRun(fingerprint) => fingerprint.as_ref(),
            Self::CanSkip => None,
        }
    }
}

/// Arguments of the read-only introspection call
pub const INFO_ARGS: [&str; 3] = ["info", "--all", "--json"];

/// Cache validity checker for one build
pub struct CacheOracle<'a> {
    executable: &'a dyn Executable,
    node_env: Option<String>,
    log: &'a BuildLog,
}

impl<'a> CacheOracle<'a> {
    pub fn new(executable: &'a dyn Executable, log: &'a BuildLog) -> Self {
        Self {
            executable,
            node_env: None,
            log,
        }
    }

    /// Environment name folded into `node_modules` fingerprints
    pub fn with_node_env(mut self, node_env: Option<String>) -> Self {
        self.node_env = node_env;
        self
    }

    /// Decide whether install must run for a project
    pub async fn decide(
        &self,
        project_dir: &Path,
        strategy: &Strategy,
        previous: &CacheMetadata,
    ) -> YarnInstallResult<Decision> {
        self.log.subprocess("Process inputs:");

        if !probe::has_lockfile(project_dir)? {
            self.log.action("yarn.lock -> Not found");
            self.log.break_line();
            return Ok(Decision::MustRun(None));
        }
        self.log.action("yarn.lock -> Found");

        let uses_node_modules = strategy.uses_node_modules();
        self.log
            .action(format!("Uses node_modules -> {}", uses_node_modules));

        if uses_node_modules {
            self.decide_node_modules(project_dir, previous).await
        } else {
            self.decide_pnp(project_dir, strategy)
        }
    }

    async fn decide_node_modules(
        &self,
        project_dir: &Path,
        previous: &CacheMetadata,
    ) -> YarnInstallResult<Decision> {
        let execution = Execution::new(
            INFO_ARGS.iter().map(|a| a.to_string()).collect(),
            project_dir,
        )
        .captured();

        let info = match self.executable.execute(&execution).await {
            Ok(output) => output,
            Err(e) => {
                warn!("yarn info failed, forcing install: {}", e);
                self.log
                    .warning("Failed to get yarn info, falling back to install");
                self.log.break_line();
                return Ok(Decision::MustRun(None));
            }
        };

        let probe = fingerprint::probe_bytes(&info, self.node_env.as_deref());
        let current = fingerprint::compute(project_dir, &probe)?;
        self.log.break_line();

        match previous.cache_sha() {
            Some(recorded) if recorded == current => {
                debug!("Fingerprint unchanged: {}", current);
                Ok(Decision::CanSkip)
            }
            recorded => {
                debug!(
                    "Fingerprint changed: {} -> {}",
                    recorded.as_ref().map(Fingerprint::as_str).unwrap_or("<none>"),
                    current
                );
                Ok(Decision::MustRun(Some(current)))
            }
        }
    }

    fn decide_pnp(&self, project_dir: &Path, strategy: &Strategy) -> YarnInstallResult<Decision> {
        let has_yarnrc = strategy.config.is_some();
        self.log.action(format!(".yarnrc.yml -> {}", has_yarnrc));

        let has_pnp = probe::has_pnp_manifest(project_dir)?;
        self.log.action(format!(".pnp.cjs -> {}", has_pnp));

        let has_cache = probe::has_local_cache(project_dir, strategy.config.as_ref())?;
        self.log.action(format!("Yarn cache -> {}", has_cache));
        self.log.break_line();

        if has_yarnrc && has_pnp && has_cache {
            self.log.action("PnP setup complete, skipping install");
            return Ok(Decision::CanSkip);
        }

        Ok(Decision::MustRun(None))
    }
}
