//! Staging directory layout: wrapper promotion and tree copies.
//!
//! These are blocking filesystem operations; async callers run them on the
//! blocking pool.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Directory names a library bundle keeps at its root.
pub const WELL_KNOWN_DIRS: [&str; 3] = ["src", "vars", "resources"];

/// Outcome of [`normalize_layout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalization {
    /// The single wrapper directory with this name was dissolved into the root.
    Promoted(String),
    /// The single child is a well-known directory and was left in place.
    WellKnown(String),
    /// Zero or several children, or a single non-directory.
    Unchanged,
}

/// Promote the contents of a lone wrapper directory to the staging root.
///
/// Applies only when `staging` has exactly one child, that child is a real
/// directory (symlinks are not followed), and its name is not one of
/// [`WELL_KNOWN_DIRS`]. One level only.
pub fn normalize_layout(staging: &Path) -> Result<Normalization> {
    let mut children = Vec::new();
    for entry in fs::read_dir(staging).map_err(Error::io(staging, "read"))? {
        children.push(entry.map_err(Error::io(staging, "read"))?);
        if children.len() > 1 {
            return Ok(Normalization::Unchanged);
        }
    }

    let Some(child) = children.pop() else {
        return Ok(Normalization::Unchanged);
    };
    let file_type = child.file_type().map_err(Error::io(&child.path(), "stat"))?;
    if !file_type.is_dir() {
        return Ok(Normalization::Unchanged);
    }

    let name = child.file_name().to_string_lossy().into_owned();
    if WELL_KNOWN_DIRS.contains(&name.as_str()) {
        trace!(dir = %name, "Single well-known directory, layout kept");
        return Ok(Normalization::WellKnown(name));
    }

    // A grandchild may share the wrapper's name, so move the wrapper aside first.
    let wrapper = staging.join(format!(".oraslib-unwrap-{}", Uuid::new_v4().simple()));
    fs::rename(child.path(), &wrapper).map_err(Error::io(&child.path(), "rename"))?;

    for entry in fs::read_dir(&wrapper).map_err(Error::io(&wrapper, "read"))? {
        let entry = entry.map_err(Error::io(&wrapper, "read"))?;
        let dest = staging.join(entry.file_name());
        fs::rename(entry.path(), &dest).map_err(Error::io(&dest, "move"))?;
    }
    fs::remove_dir(&wrapper).map_err(Error::io(&wrapper, "remove"))?;

    debug!(wrapper = %name, staging = %staging.display(), "Promoted wrapper directory");
    Ok(Normalization::Promoted(name))
}

/// Recursively copy the contents of `src` into `dst`.
///
/// `dst` is created when missing and existing files are overwritten.
/// Returns the number of files and links copied.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<usize> {
    fs::create_dir_all(dst).map_err(Error::io(dst, "create"))?;

    let mut count = 0usize;
    for entry in walkdir::WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().map_or_else(|| src.to_path_buf(), Path::to_path_buf);
            Error::filesystem(&path, "walk", e.into())
        })?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|_| Error::filesystem(entry.path(), "walk", outside_root(src)))?;
        let target = dst.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(Error::io(&target, "create"))?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
            count += 1;
        } else {
            fs::copy(entry.path(), &target).map_err(Error::io(&target, "copy"))?;
            count += 1;
        }
    }

    trace!(src = %src.display(), dst = %dst.display(), count, "Copied tree");
    Ok(count)
}

/// Remove every entry under `dir`, keeping `dir` itself.
pub fn clear_dir(dir: &Path) -> Result<()> {
    for entry in fs::read_dir(dir).map_err(Error::io(dir, "read"))? {
        let entry = entry.map_err(Error::io(dir, "read"))?;
        let path = entry.path();
        let is_dir = entry.file_type().map_err(Error::io(&path, "stat"))?.is_dir();
        if is_dir {
            fs::remove_dir_all(&path).map_err(Error::io(&path, "remove"))?;
        } else {
            fs::remove_file(&path).map_err(Error::io(&path, "remove"))?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> Result<()> {
    let points_to: PathBuf = fs::read_link(link).map_err(Error::io(link, "readlink"))?;
    if fs::symlink_metadata(target).is_ok() {
        fs::remove_file(target).map_err(Error::io(target, "remove"))?;
    }
    std::os::unix::fs::symlink(&points_to, target).map_err(Error::io(target, "symlink"))
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, target: &Path) -> Result<()> {
    fs::copy(link, target)
        .map(|_| ())
        .map_err(Error::io(target, "copy"))
}

fn outside_root(root: &Path) -> std::io::Error {
    std::io::Error::other(format!("entry is not under {}", root.display()))
}
