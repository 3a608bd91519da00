//! `package.json` fields used by detection

use crate::config::PACKAGE_JSON;
use crate::error::{YarnInstallError, YarnInstallResult};
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::Path;

/// The subset of `package.json` this step reads
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageJson {
    #[serde(default)]
    pub engines: Engines,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Engines {
    /// Node.js version constraint, passed through to the build plan
    pub node: Option<String>,
}

impl PackageJson {
    /// Declared Node.js constraint, if any and non-empty
    pub fn node_version(&self) -> Option<&str> {
        self.engines.node.as_deref().filter(|v| !v.trim().is_empty())
    }
}

/// Read `package.json`; `Ok(None)` if the project has none
pub async fn read_package_json(project_dir: &Path) -> YarnInstallResult<Option<PackageJson>> {
    let path = project_dir.join(PACKAGE_JSON);
    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(YarnInstallError::io(
                format!("reading {}", path.display()),
                e,
            ))
        }
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| YarnInstallError::ConfigInvalid {
            path,
            reason: e.to_string(),
        })
}
