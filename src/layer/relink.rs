//! Launch-time symlink repair
//!
//! At build time `<app>/node_modules` is a symlink to a path that only
//! exists inside the build container. At launch the layer is mounted
//! somewhere else, so the link target is recreated as a symlink into the
//! launch layer. The launch helper lives at `<layer>/bin/<name>`, which is
//! how the layer path is found.
//!
//! The project is classified with the same reader and classifier as the
//! build, so a malformed `.yarnrc.yml` is an error here too.

use crate::config::NODE_MODULES;
use crate::error::{YarnInstallError, YarnInstallResult};
use crate::layer::materialize::{is_symlink, remove_link, symlink_dir};
use crate::strategy::Strategy;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Layer directory that contains `<layer>/bin/<executable>`
fn layer_from_executable(executable_path: &Path) -> YarnInstallResult<PathBuf> {
    executable_path
        .parent()
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            YarnInstallError::User(format!(
                "Cannot derive layer directory from executable path {}",
                executable_path.display()
            ))
        })
}

/// Re-point the target of `<app>/node_modules` at the launch layer
pub async fn setup_symlinks(executable_path: &Path, app_dir: &Path) -> YarnInstallResult<()> {
    let strategy = Strategy::resolve(app_dir).await?;
    if !strategy.uses_node_modules() {
        debug!("PnP project, no node_modules symlink to repair");
        return Ok(());
    }

    let layer = layer_from_executable(executable_path)?;
    let link = app_dir.join(NODE_MODULES);

    let target = match fs::read_link(&link) {
        Ok(target) => target,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{} does not exist, nothing to repair", link.display());
            return Ok(());
        }
        Err(e) => {
            return Err(YarnInstallError::io(
                format!("reading symlink {}", link.display()),
                e,
            ))
        }
    };
    let target = if target.is_absolute() {
        target
    } else {
        app_dir.join(target)
    };

    if target.is_dir() {
        debug!("{} already resolves, leaving it", target.display());
        return Ok(());
    }

    if is_symlink(&target)? || target.is_file() {
        remove_link(&target).map_err(|e| {
            YarnInstallError::io(format!("removing {}", target.display()), e)
        })?;
    }

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            YarnInstallError::io(format!("creating {}", parent.display()), e)
        })?;
    }

    let layer_modules = layer.join(NODE_MODULES);
    debug!("Linking {} -> {}", target.display(), layer_modules.display());
    symlink_dir(&layer_modules, &target).map_err(|e| {
        YarnInstallError::io(format!("linking {}", target.display()), e)
    })
}
