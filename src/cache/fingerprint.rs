//! Cache fingerprints for `node_modules` layers
//!
//! A fingerprint covers `yarn.lock`, `package.json` and a synthetic probe
//! (the output of `yarn info --all --json` followed by `NODE_ENV`). Each
//! input is hashed on its own and the fingerprint is the SHA256 of the
//! concatenated per-input digests, so the same bytes always give the same
//! fingerprint and moving bytes between inputs never collides.

use crate::config::{PACKAGE_JSON, YARN_LOCK};
use crate::error::{YarnInstallError, YarnInstallResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::Path;

/// Hex-encoded SHA256 over the install inputs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap a previously recorded fingerprint
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hash a file's contents using SHA256
fn hash_file_contents(path: &Path) -> YarnInstallResult<Vec<u8>> {
    let contents = fs::read(path).map_err(|e| YarnInstallError::Io {
        context: format!("reading {}", path.display()),
        source: e,
    })?;
    Ok(Sha256::digest(&contents).to_vec())
}

/// Bytes of the behavioral probe: introspection output, then the environment name
pub fn probe_bytes(introspection: &[u8], node_env: Option<&str>) -> Vec<u8> {
    let mut probe = introspection.to_vec();
    probe.extend_from_slice(node_env.unwrap_or_default().as_bytes());
    probe
}

/// Fingerprint a project's lock file, manifest and probe
pub fn compute(project_dir: &Path, probe: &[u8]) -> YarnInstallResult<Fingerprint> {
    let digests = [
        hash_file_contents(&project_dir.join(YARN_LOCK))?,
        hash_file_contents(&project_dir.join(PACKAGE_JSON))?,
        Sha256::digest(probe).to_vec(),
    ];

    let mut hasher = Sha256::new();
    for digest in &digests {
        hasher.update(digest);
    }

    Ok(Fingerprint(hex::encode(hasher.finalize())))
}
