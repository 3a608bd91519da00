//! Dependency layers
//!
//! A layer is a directory under the layers dir that survives between
//! builds. This module owns the on-disk layout of a layer, moving the
//! dependency tree into it, and repairing the project symlink that points
//! at it.

pub mod manifest;
pub mod materialize;
pub mod relink;

pub use manifest::{LayerManifest, LayerTypes};
pub use materialize::{link_into_project, stage};
pub use relink::setup_symlinks;

use crate::error::{YarnInstallError, YarnInstallResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Layer holding build-time dependencies (dev dependencies included)
pub const BUILD_MODULES: &str = "build-modules";
/// Layer holding launch-time dependencies
pub const LAUNCH_MODULES: &str = "launch-modules";

/// A layer directory plus its metadata file
#[derive(Debug, Clone)]
pub struct Layer {
    pub name: String,
    /// `<layers>/<name>`
    pub path: PathBuf,
    /// Contents of `<layers>/<name>.toml` as found at the start of the build
    pub manifest: LayerManifest,
    layers_dir: PathBuf,
}

impl Layer {
    /// Open a layer, loading whatever metadata a previous build left behind
    pub async fn open(layers_dir: &Path, name: &str) -> YarnInstallResult<Self> {
        let manifest_path = layers_dir.join(format!("{}.toml", name));
        let manifest = LayerManifest::from_file(&manifest_path).await?;
        debug!(
            "Opened layer {} (cache_sha: {:?})",
            name,
            manifest.metadata.cache_sha()
        );

        Ok(Self {
            name: name.to_string(),
            path: layers_dir.join(name),
            manifest,
            layers_dir: layers_dir.to_path_buf(),
        })
    }

    /// Path of the metadata file
    pub fn manifest_path(&self) -> PathBuf {
        self.layers_dir.join(format!("{}.toml", self.name))
    }

    /// Create the layer directory if needed
    pub async fn ensure_dir(&self) -> YarnInstallResult<()> {
        tokio::fs::create_dir_all(&self.path).await.map_err(|e| {
            YarnInstallError::io(format!("creating layer {}", self.path.display()), e)
        })
    }

    /// Persist the manifest
    pub async fn save(&self) -> YarnInstallResult<()> {
        self.manifest.write(&self.manifest_path()).await
    }
}
