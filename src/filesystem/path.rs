// src/filesystem/path.rs

//! Lexical path utilities
//!
//! Everything here works on path text only and never touches the
//! filesystem, so symlinks are not resolved. That is what symlink
//! relativization needs: the link target must keep naming the same path.

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path
///
/// Removes `.` components and folds `..` into the preceding component.
/// A `..` directly under the root stays at the root; leading `..` in a
/// relative path are kept.
///
/// # Examples
///
/// ```
/// use keg_relocate::filesystem::path::normalize;
/// use std::path::PathBuf;
///
/// assert_eq!(normalize("/opt/pkg/./lib/../bin"), PathBuf::from("/opt/pkg/bin"));
/// assert_eq!(normalize("/.."), PathBuf::from("/"));
/// assert_eq!(normalize("../a/./b"), PathBuf::from("../a/b"));
/// ```
pub fn normalize(path: impl AsRef<Path>) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.as_ref().components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }

    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }
    normalized
}

/// Compute `path` relative to the directory `base`
///
/// Both paths must be absolute, or both relative. Returns `None` when no
/// lexical answer exists (mixed absolute/relative, or `base` climbs above
/// the shared ancestor with `..`).
///
/// # Examples
///
/// ```
/// use keg_relocate::filesystem::path::relative_path_from;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(
///     relative_path_from(
///         Path::new("/opt/pkg/Cellar/foo/1.0/lib/libfoo.so"),
///         Path::new("/opt/pkg/lib"),
///     ),
///     Some(PathBuf::from("../Cellar/foo/1.0/lib/libfoo.so"))
/// );
/// ```
pub fn relative_path_from(path: &Path, base: &Path) -> Option<PathBuf> {
    if path.is_absolute() != base.is_absolute() {
        return None;
    }

    let path = normalize(path);
    let base = normalize(base);

    let mut path_components = path.components().peekable();
    let mut base_components = base.components().peekable();

    while let (Some(p), Some(b)) = (path_components.peek(), base_components.peek()) {
        if p != b {
            break;
        }
        path_components.next();
        base_components.next();
    }

    let mut relative = PathBuf::new();
    for component in base_components {
        match component {
            Component::Normal(_) => relative.push(".."),
            Component::CurDir => {}
            _ => return None,
        }
    }
    for component in path_components {
        if component != Component::CurDir {
            relative.push(component.as_os_str());
        }
    }

    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    Some(relative)
}

/// Resolve a caller-supplied file path against a keg root
///
/// Absolute paths are accepted only when they already lie under the root;
/// relative paths are joined onto it. Either way the result cannot escape
/// the root through `..`.
pub fn resolve_in_root(root: &Path, path: &Path) -> Result<PathBuf> {
    let root = normalize(root);
    let joined = normalize(root.join(path));

    if !joined.starts_with(&root) {
        return Err(Error::PathTraversal(format!(
            "{} escapes {}",
            path.display(),
            root.display()
        )));
    }

    Ok(joined)
}
