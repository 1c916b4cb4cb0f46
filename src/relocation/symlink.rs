// src/relocation/symlink.rs

//! Symlink relativization
//!
//! An absolute symlink into the prefix or cellar breaks as soon as the keg
//! is installed somewhere else. Rewriting it relative to the link's own
//! directory keeps it pointing at the same place in the new location.
//! Relative links and links to paths outside the managed roots are left
//! alone.

use crate::error::{Error, Result};
use crate::filesystem::{relative_path_from, replace_symlink};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Relativize absolute symlinks under `root` that point into a managed root
///
/// Returns the symlinks that were rewritten.
pub fn relativize(root: &Path, managed_roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut rewritten = Vec::new();

    // The root itself may be a symlink into the cellar; it is not ours to rewrite
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.path_is_symlink() {
            continue;
        }
        let link = entry.path();

        let target = fs::read_link(link).map_err(|source| Error::Symlink {
            path: link.to_path_buf(),
            source,
        })?;
        if target.is_relative() {
            continue;
        }
        if !managed_roots.iter().any(|managed| target.starts_with(managed)) {
            continue;
        }

        let parent = link.parent().unwrap_or(root);
        let Some(relative) = relative_path_from(&target, parent) else {
            debug!(
                "No relative form of {} from {}",
                target.display(),
                parent.display()
            );
            continue;
        };

        replace_symlink(link, &relative)?;
        debug!(
            "Relativized {}: {} -> {}",
            link.display(),
            target.display(),
            relative.display()
        );
        rewritten.push(link.to_path_buf());
    }

    Ok(rewritten)
}
