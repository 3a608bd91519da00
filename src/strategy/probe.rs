//! Filesystem signals consulted by the classifier and the cache oracle
//!
//! One predicate per signal. Absence is `Ok(false)`; only unexpected IO
//! failures (permission denied, etc.) are errors.

use crate::config::{YarnrcConfig, PNP_CJS, YARNRC_YML, YARN_LOCK};
use crate::error::{YarnInstallError, YarnInstallResult};
use std::path::{Path, PathBuf};

fn exists(path: &Path) -> YarnInstallResult<bool> {
    path.try_exists()
        .map_err(|e| YarnInstallError::io(format!("checking {}", path.display()), e))
}

/// `.yarnrc.yml` is present
pub fn has_yarnrc(project_dir: &Path) -> YarnInstallResult<bool> {
    exists(&project_dir.join(YARNRC_YML))
}

/// `yarn.lock` is present
pub fn has_lockfile(project_dir: &Path) -> YarnInstallResult<bool> {
    exists(&project_dir.join(YARN_LOCK))
}

/// `.pnp.cjs` is present
pub fn has_pnp_manifest(project_dir: &Path) -> YarnInstallResult<bool> {
    exists(&project_dir.join(PNP_CJS))
}

/// Location of the project-local offline cache
pub fn local_cache_path(project_dir: &Path, config: Option<&YarnrcConfig>) -> PathBuf {
    let folder = config
        .map(YarnrcConfig::cache_folder)
        .unwrap_or(crate::config::DEFAULT_CACHE_FOLDER);
    project_dir.join(folder)
}

/// The offline cache directory is present (custom `cacheFolder` honored)
pub fn has_local_cache(project_dir: &Path, config: Option<&YarnrcConfig>) -> YarnInstallResult<bool> {
    exists(&local_cache_path(project_dir, config))
}
