//! Project configuration reader
//!
//! Loads `.yarnrc.yml` from the project root. A missing file is a valid
//! state (`Ok(None)`), distinct from a present-but-empty file
//! (`Ok(Some(default))`). A file that exists but cannot be parsed is a
//! hard error; callers never fall back to the missing-file behavior.

pub mod schema;

pub use schema::{YarnrcConfig, DEFAULT_CACHE_FOLDER};

use crate::error::{YarnInstallError, YarnInstallResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Berry configuration file
pub const YARNRC_YML: &str = ".yarnrc.yml";
/// Lock file shared by Classic and Berry
pub const YARN_LOCK: &str = "yarn.lock";
/// Project manifest
pub const PACKAGE_JSON: &str = "package.json";
/// PnP runtime loader written by Berry
pub const PNP_CJS: &str = ".pnp.cjs";
/// Flat dependency directory
pub const NODE_MODULES: &str = "node_modules";

/// Path of `.yarnrc.yml` inside a project
pub fn yarnrc_path(project_dir: &Path) -> PathBuf {
    project_dir.join(YARNRC_YML)
}

/// Load the project's `.yarnrc.yml`, if there is one
pub async fn read_yarnrc(project_dir: &Path) -> YarnInstallResult<Option<YarnrcConfig>> {
    let path = yarnrc_path(project_dir);

    let content = match fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No {} in {}", YARNRC_YML, project_dir.display());
            return Ok(None);
        }
        Err(e) => {
            return Err(YarnInstallError::io(
                format!("reading config from {}", path.display()),
                e,
            ))
        }
    };

    parse_yarnrc(&content, &path).map(Some)
}

/// Parse `.yarnrc.yml` content. Empty and comment-only documents yield the default config.
pub fn parse_yarnrc(content: &str, path: &Path) -> YarnInstallResult<YarnrcConfig> {
    let invalid = |e: serde_yaml::Error| YarnInstallError::ConfigInvalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let value: serde_yaml::Value = serde_yaml::from_str(content).map_err(invalid)?;
    if value.is_null() {
        return Ok(YarnrcConfig::default());
    }

    serde_yaml::from_value(value).map_err(invalid)
}
