// src/relocation/hardlink.rs

//! Hardlink grouping
//!
//! Several paths in a keg may name one physical file. Substitution reads
//! and writes each physical file once, through a representative path, and
//! then points the other paths back at it.

use crate::error::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

/// Paths sharing one inode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardlinkGroup {
    /// Path used to read and write the content
    pub representative: PathBuf,
    /// Every other path naming the same inode
    pub others: Vec<PathBuf>,
}

impl HardlinkGroup {
    /// All member paths, representative first
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.representative.as_path()).chain(self.others.iter().map(PathBuf::as_path))
    }

    pub fn len(&self) -> usize {
        1 + self.others.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Partition `files` by (device, inode)
///
/// Groups come back in order of first appearance and the first path seen
/// for an inode becomes its representative. Repeated paths are dropped.
pub fn group_by_inode(files: &[PathBuf]) -> Result<Vec<HardlinkGroup>> {
    let mut groups: Vec<HardlinkGroup> = Vec::new();
    let mut index: HashMap<(u64, u64), usize> = HashMap::new();
    let mut seen: HashSet<&Path> = HashSet::new();

    for file in files {
        if !seen.insert(file.as_path()) {
            continue;
        }

        let metadata = fs::metadata(file).map_err(|source| Error::Read {
            path: file.clone(),
            source,
        })?;
        let key = (metadata.dev(), metadata.ino());

        match index.get(&key) {
            Some(&i) => groups[i].others.push(file.clone()),
            None => {
                index.insert(key, groups.len());
                groups.push(HardlinkGroup {
                    representative: file.clone(),
                    others: Vec::new(),
                });
            }
        }
    }

    Ok(groups)
}
