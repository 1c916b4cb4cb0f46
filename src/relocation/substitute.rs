// src/relocation/substitute.rs

//! Literal placeholder substitution
//!
//! All search strings are compiled into one alternation, longest first. The
//! regex engine prefers earlier alternatives at a given position, so a key
//! that is a prefix of another (repository vs. library, prefix vs. cellar)
//! never splits a longer match. The whole file is rewritten in one pass.

use super::hardlink::group_by_inode;
use super::{ChangeSet, Relocation};
use crate::error::{Error, Result};
use crate::filesystem::{WriteMethod, force_hard_link, resolve_in_root, write_file};
use crate::keg::Keg;
use regex::bytes::{Captures, Regex};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Compiled search/replacement mapping for one relocation
#[derive(Debug, Clone)]
pub struct ReplacementTable {
    pattern: Option<Regex>,
    replacements: HashMap<Vec<u8>, Vec<u8>>,
}

impl ReplacementTable {
    /// Build the table for `relocation`
    ///
    /// Empty search strings are dropped; they would match everywhere.
    pub fn new(relocation: &Relocation, repository_is_prefix: bool) -> Result<Self> {
        let mut replacements = HashMap::new();
        for (old, new) in relocation.replacements(repository_is_prefix) {
            if !old.is_empty() {
                replacements.insert(old.as_bytes().to_vec(), new.as_bytes().to_vec());
            }
        }

        let mut keys: Vec<&Vec<u8>> = replacements.keys().collect();
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let pattern = if keys.is_empty() {
            None
        } else {
            let alternation = keys
                .iter()
                .map(|key| regex::escape(&String::from_utf8_lossy(key)))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&alternation)?)
        };

        Ok(Self {
            pattern,
            replacements,
        })
    }

    /// Substitute every occurrence in `content`
    ///
    /// Returns `None` when the result would be byte-identical.
    pub fn apply(&self, content: &[u8]) -> Option<Vec<u8>> {
        let pattern = self.pattern.as_ref()?;

        let replaced = pattern.replace_all(content, |caps: &Captures| {
            self.replacements
                .get(&caps[0])
                .cloned()
                .unwrap_or_else(|| caps[0].to_vec())
        });

        match replaced {
            Cow::Borrowed(_) => None,
            Cow::Owned(new) if new == content => None,
            Cow::Owned(new) => Some(new),
        }
    }
}

/// Apply `relocation` to `files` inside `keg`
///
/// Each physical file is read once through its hardlink group's
/// representative. Changed content is written atomically when possible,
/// after which the rest of the group is relinked to the new inode. The
/// returned change set lists every keg-relative path whose bytes changed.
///
/// Not transactional: a write failure aborts the call, leaving groups
/// already processed rewritten. Rerunning is safe.
pub fn replace_text_in_files(
    keg: &Keg,
    relocation: &Relocation,
    repository_is_prefix: bool,
    files: &[PathBuf],
) -> Result<ChangeSet> {
    let table = ReplacementTable::new(relocation, repository_is_prefix)?;

    let paths = files
        .iter()
        .map(|file| resolve_in_root(keg.path(), file))
        .collect::<Result<Vec<_>>>()?;

    let mut changed = ChangeSet::new();
    for group in group_by_inode(&paths)? {
        let content = fs::read(&group.representative).map_err(|source| Error::Read {
            path: group.representative.clone(),
            source,
        })?;

        let Some(new_content) = table.apply(&content) else {
            continue;
        };

        let method = write_file(&group.representative, &new_content)?;
        // An in-place write kept the inode, so the group is still linked
        if method == WriteMethod::Atomic {
            for other in &group.others {
                force_hard_link(&group.representative, other)?;
            }
        }

        debug!(
            "Relocated {} ({} links, {:?})",
            group.representative.display(),
            group.len(),
            method
        );
        for path in group.paths() {
            changed.push(keg.relative(path));
        }
    }

    Ok(changed)
}
