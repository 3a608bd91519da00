//! Layer staging
//!
//! Puts the dependency tree where the install step expects it.
//!
//! For `node_modules` linkers the tree lives in `<layer>/node_modules` and
//! the project's `node_modules` is a symlink into the layer, so moving the
//! whole tree later only means re-pointing one link. For PnP nothing is
//! moved; the layer itself becomes the Yarn cache location.
//!
//! Replacing the project symlink is not atomic. A crash between removing
//! the old link and creating the new one leaves no link; the build is then
//! retried from a clean checkout and no metadata has been written.

use crate::config::NODE_MODULES;
use crate::error::{YarnInstallError, YarnInstallResult};
use crate::strategy::LinkingMode;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Stage the dependency directory for an install into `next_layer`.
///
/// Returns the layer path the install should target.
pub fn stage(
    project_dir: &Path,
    current_layer: Option<&Path>,
    next_layer: &Path,
    mode: LinkingMode,
) -> YarnInstallResult<PathBuf> {
    if !mode.uses_node_modules() {
        debug!("PnP: using {} as the cache location", next_layer.display());
        return Ok(next_layer.to_path_buf());
    }

    let next_modules = next_layer.join(NODE_MODULES);

    if let Some(current) = current_layer {
        let current_modules = current.join(NODE_MODULES);
        debug!(
            "Copying {} -> {}",
            current_modules.display(),
            next_modules.display()
        );
        clear(&next_modules)?;
        copy_dir_all(&current_modules, &next_modules).map_err(|e| {
            YarnInstallError::io(
                format!("copying {} into {}", current_modules.display(), next_layer.display()),
                e,
            )
        })?;
        return Ok(next_layer.to_path_buf());
    }

    let project_modules = project_dir.join(NODE_MODULES);

    if is_symlink(&project_modules)? {
        debug!("Removing stale symlink {}", project_modules.display());
        remove_link(&project_modules).map_err(|e| {
            YarnInstallError::io(
                format!("removing {} symlink", project_modules.display()),
                e,
            )
        })?;
    }

    fs::create_dir_all(&project_modules).map_err(|e| {
        YarnInstallError::io(format!("creating {}", project_modules.display()), e)
    })?;
    fs::create_dir_all(next_layer).map_err(|e| {
        YarnInstallError::io(format!("creating layer {}", next_layer.display()), e)
    })?;

    clear(&next_modules)?;
    move_dir(&project_modules, &next_modules).map_err(|e| {
        YarnInstallError::io(
            format!("moving {} into {}", project_modules.display(), next_layer.display()),
            e,
        )
    })?;

    symlink_dir(&next_modules, &project_modules).map_err(|e| {
        YarnInstallError::io(
            format!("linking {} into the project", next_modules.display()),
            e,
        )
    })?;

    Ok(next_layer.to_path_buf())
}

/// Point `<project>/node_modules` at `<layer>/node_modules`, replacing
/// whatever is there. Used when a cached layer is reused without installing.
pub fn link_into_project(project_dir: &Path, layer: &Path) -> YarnInstallResult<()> {
    let project_modules = project_dir.join(NODE_MODULES);
    let layer_modules = layer.join(NODE_MODULES);

    let removed = if is_symlink(&project_modules)? {
        remove_link(&project_modules)
    } else if project_modules.is_dir() {
        debug!("Replacing directory {} with a link", project_modules.display());
        fs::remove_dir_all(&project_modules)
    } else {
        Ok(())
    };
    removed
        .map_err(|e| YarnInstallError::io(format!("removing {}", project_modules.display()), e))?;

    symlink_dir(&layer_modules, &project_modules).map_err(|e| {
        YarnInstallError::io(
            format!("linking {} into the project", layer_modules.display()),
            e,
        )
    })
}

/// Whether a path is itself a symlink (not followed)
pub(crate) fn is_symlink(path: &Path) -> YarnInstallResult<bool> {
    match fs::symlink_metadata(path) {
        Ok(meta) => Ok(meta.file_type().is_symlink()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(YarnInstallError::io(format!("inspecting {}", path.display()), e)),
    }
}

/// Remove a known subpath of a layer before it is replaced
fn clear(path: &Path) -> YarnInstallResult<()> {
    let result = if is_symlink(path)? || path.is_file() {
        remove_link(path)
    } else if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        return Ok(());
    };
    result.map_err(|e| YarnInstallError::io(format!("clearing {}", path.display()), e))
}

/// Remove a symlink without touching its target
pub(crate) fn remove_link(path: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        // Directory symlinks on Windows are removed as directories
        if fs::remove_dir(path).is_ok() {
            return Ok(());
        }
    }
    fs::remove_file(path)
}

#[cfg(unix)]
pub(crate) fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
pub(crate) fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

/// Rename a directory, falling back to copy + delete across filesystems
fn move_dir(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!("rename failed ({}), copying instead", e);
            copy_dir_all(from, to)?;
            fs::remove_dir_all(from)
        }
    }
}

/// Copy a directory tree, recreating symlinks rather than following them
fn copy_dir_all(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir_all(to)?;

    for entry in WalkDir::new(from).follow_links(false) {
        let entry = entry?;
        if entry.depth() == 0 {
            continue;
        }

        let rel = entry
            .path()
            .strip_prefix(from)
            .map_err(io::Error::other)?;
        let dest = to.join(rel);
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            let target = fs::read_link(entry.path())?;
            copy_symlink(&target, &dest, entry.path())?;
        } else if file_type.is_dir() {
            fs::create_dir_all(&dest)?;
        } else {
            fs::copy(entry.path(), &dest)?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn copy_symlink(target: &Path, dest: &Path, _source: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, dest)
}

#[cfg(windows)]
fn copy_symlink(target: &Path, dest: &Path, source: &Path) -> io::Result<()> {
    if source.is_dir() {
        std::os::windows::fs::symlink_dir(target, dest)
    } else {
        std::os::windows::fs::symlink_file(target, dest)
    }
}
