// src/filesystem/atomic.rs

//! Safe file replacement primitives
//!
//! Content rewrites go through a temp file in the same directory followed
//! by a rename, so readers see either the old or the new bytes. When that
//! is impossible (read-only directory, filesystem without rename support)
//! the file is overwritten in place instead, temporarily granting owner
//! write permission if needed.

use crate::error::{Error, Result};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// How a file's new content reached the disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMethod {
    /// Replaced by rename; the path now names a new inode
    Atomic,
    /// Overwritten in place; the inode is unchanged
    InPlace,
}

/// Replace a file's content, atomically if possible
///
/// Returns how the write happened so callers can tell whether other
/// hardlinks to the old inode still see the new content.
pub fn write_file(path: &Path, content: &[u8]) -> Result<WriteMethod> {
    match atomic_write(path, content) {
        Ok(()) => Ok(WriteMethod::Atomic),
        Err(e) => {
            warn!(
                "Atomic write of {} failed ({}), overwriting in place",
                path.display(),
                e
            );
            with_writable(path, || write_in_place(path, content)).map_err(|source| {
                Error::Write {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            Ok(WriteMethod::InPlace)
        }
    }
}

/// Write to a sibling temp file and rename it over `path`
///
/// The replacement keeps the permission bits of the file it replaces, and
/// its ownership when the process is allowed to set it.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let metadata = fs::metadata(path)?;
    let dir = parent_dir(path);

    let mut temp = tempfile::Builder::new()
        .prefix(".keg-relocate")
        .tempfile_in(dir)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;

    if let Err(e) = std::os::unix::fs::chown(temp.path(), Some(metadata.uid()), Some(metadata.gid()))
    {
        debug!("Could not preserve ownership of {}: {}", path.display(), e);
    }
    fs::set_permissions(temp.path(), metadata.permissions())?;

    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Truncate and rewrite a file without changing its inode
pub fn write_in_place(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).truncate(true).open(path)?;
    file.write_all(content)?;
    file.sync_all()
}

/// Run `f` with owner write permission on `path`, restoring the mode after
pub fn with_writable<T>(path: &Path, f: impl FnOnce() -> io::Result<T>) -> io::Result<T> {
    let original = fs::metadata(path)?.permissions();
    let mode = original.mode();

    if mode & 0o200 != 0 {
        return f();
    }

    fs::set_permissions(path, fs::Permissions::from_mode(mode | 0o200))?;
    let result = f();
    let restored = fs::set_permissions(path, original);
    let value = result?;
    restored?;
    Ok(value)
}

/// Make `link` a hardlink to `target`, replacing whatever is there
pub fn force_hard_link(target: &Path, link: &Path) -> Result<()> {
    let relink = || -> io::Result<()> {
        if fs::symlink_metadata(link).is_ok() {
            fs::remove_file(link)?;
        }
        fs::hard_link(target, link)
    };
    relink().map_err(|source| Error::Hardlink {
        path: link.to_path_buf(),
        target: target.to_path_buf(),
        source,
    })
}

/// Point the symlink at `link` to `target`
///
/// The new link is created under a temporary name and renamed over the old
/// one, so the path never goes missing.
pub fn replace_symlink(link: &Path, target: &Path) -> Result<()> {
    let temp = temp_sibling(link);
    let replace = || -> io::Result<()> {
        if fs::symlink_metadata(&temp).is_ok() {
            fs::remove_file(&temp)?;
        }
        std::os::unix::fs::symlink(target, &temp)?;
        fs::rename(&temp, link).inspect_err(|_| {
            let _ = fs::remove_file(&temp);
        })
    };
    replace().map_err(|source| Error::Symlink {
        path: link.to_path_buf(),
        source,
    })
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    parent_dir(path).join(format!(".{}.keg-relocate-tmp", name))
}
