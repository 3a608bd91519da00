//! Layer content metadata file
//!
//! Each layer directory `<layers>/<name>/` has a sibling `<name>.toml`
//! describing where the layer is available and the cache metadata that
//! survives between builds.
//!
//! ```toml
//! [types]
//! build = true
//! launch = false
//! cache = true
//!
//! [metadata]
//! cache_sha = "3f2a..."
//! built_at = "2024-01-15T10:00:00.000000000Z"
//! ```

use crate::cache::CacheMetadata;
use crate::error::{YarnInstallError, YarnInstallResult};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;

/// Parsed `<name>.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerManifest {
    /// Layer availability flags
    #[serde(default)]
    pub types: LayerTypes,

    /// Cache metadata carried across builds
    #[serde(default, skip_serializing_if = "CacheMetadata::is_empty")]
    pub metadata: CacheMetadata,
}

/// Where the layer is made available
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerTypes {
    /// Visible to later build steps
    pub build: bool,
    /// Exported into the application image
    pub launch: bool,
    /// Restored on the next build
    pub cache: bool,
}

impl LayerManifest {
    /// Read a manifest from disk; a missing file yields the default (empty) manifest
    pub async fn from_file(path: &Path) -> YarnInstallResult<Self> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(YarnInstallError::io(
                    format!("reading layer metadata {}", path.display()),
                    e,
                ))
            }
        };
        Self::parse(&content, path)
    }

    /// Parse a manifest from a TOML string
    pub fn parse(content: &str, path: &Path) -> YarnInstallResult<Self> {
        toml::from_str(content).map_err(|e| YarnInstallError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Write the manifest to disk
    pub async fn write(&self, path: &Path) -> YarnInstallResult<()> {
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content).await.map_err(|e| {
            YarnInstallError::io(format!("writing layer metadata {}", path.display()), e)
        })
    }
}
