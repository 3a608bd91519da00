//! Schema of the project-level `.yarnrc.yml`
//!
//! Only the keys that influence how dependencies are installed and cached
//! are modelled. Everything else in the file is ignored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cache folder Yarn Berry uses when `cacheFolder` is not set
pub const DEFAULT_CACHE_FOLDER: &str = ".yarn/cache";

/// Parsed `.yarnrc.yml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct YarnrcConfig {
    /// Linker name (`pnp`, `node-modules`, `pnpm`, ...)
    pub node_linker: Option<String>,

    /// Glob patterns excluded from the PnP runtime
    pub pnp_ignore_patterns: Vec<String>,

    /// Offline cache location, relative to the project root
    pub cache_folder: Option<String>,

    /// Unset means "yarn default", which is enabled
    pub enable_immutable_installs: Option<bool>,

    /// Checked-in Yarn release to run instead of the global binary
    pub yarn_path: Option<String>,

    /// Passed through untouched
    pub package_extensions: BTreeMap<String, serde_yaml::Value>,
}

impl YarnrcConfig {
    /// Cache folder relative to the project root, honoring `cacheFolder`
    pub fn cache_folder(&self) -> &str {
        match self.cache_folder.as_deref() {
            Some(folder) if !folder.is_empty() => folder,
            _ => DEFAULT_CACHE_FOLDER,
        }
    }

    /// Whether `--immutable` should be passed to `yarn install`
    pub fn immutable_installs(&self) -> bool {
        self.enable_immutable_installs.unwrap_or(true)
    }
}
