// src/keg.rs

//! Installed package trees
//!
//! A keg is the directory one installed version of a package lives in,
//! conventionally `<cellar>/<name>/<version>`. Relocation borrows a keg for
//! the duration of one call and never keeps state about it.

use crate::error::{Error, Result};
use crate::filesystem::normalize;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Directory inside a keg holding the package's own metadata
pub const METADATA_DIR: &str = ".brew";

/// An installed package tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keg {
    path: PathBuf,
    name: String,
}

impl Keg {
    /// Open a keg rooted at `path` for package `name`
    pub fn new(path: impl AsRef<Path>, name: impl Into<String>) -> Result<Self> {
        let path = normalize(std::path::absolute(path.as_ref())?);

        if !path.is_dir() {
            return Err(Error::InvalidKeg(format!(
                "{} is not a directory",
                path.display()
            )));
        }

        Ok(Self {
            path,
            name: name.into(),
        })
    }

    /// Open a keg, taking the package name from its parent directory
    ///
    /// `<cellar>/foo/1.0` is keg `foo`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = normalize(std::path::absolute(path.as_ref())?);
        let name = path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::InvalidKeg(format!(
                    "cannot infer package name from {}",
                    path.display()
                ))
            })?;
        Self::new(path, name)
    }

    /// Keg root directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Package name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lib(&self) -> PathBuf {
        self.path.join("lib")
    }

    pub fn libexec(&self) -> PathBuf {
        self.path.join("libexec")
    }

    /// The package descriptor embedded in the keg at install time
    pub fn descriptor_path(&self) -> PathBuf {
        self.path
            .join(METADATA_DIR)
            .join(format!("{}.rb", self.name))
    }

    /// Express `path` relative to the keg root when it lies inside it
    pub fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.path)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }

    /// Walk every entry under the keg without following symlinks
    ///
    /// Entries come back in a stable, name-sorted order. The keg root itself
    /// is not an entry, even when it was opened through a symlink.
    pub fn entries(&self) -> Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.path).min_depth(1).sort_by_file_name() {
            entries.push(entry?);
        }
        Ok(entries)
    }

    /// Every symlink under the keg
    pub fn symlink_files(&self) -> Result<Vec<PathBuf>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|entry| entry.path_is_symlink())
            .map(DirEntry::into_path)
            .collect())
    }

    /// Every regular (non-symlink, non-directory) file under the keg
    pub fn regular_files(&self) -> Result<Vec<PathBuf>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|entry| !entry.path_is_symlink() && !entry.file_type().is_dir())
            .map(DirEntry::into_path)
            .collect())
    }

    /// Files under the keg whose content contains `needle`
    ///
    /// Runs a recursive literal grep over the keg. Symlinks are skipped and
    /// each physical file is reported once, however many hardlinks name it.
    pub fn each_unique_file_matching(&self, needle: &str) -> Result<Vec<PathBuf>> {
        let grep = which::which("grep").map_err(|_| Error::ToolNotFound("grep".to_string()))?;

        let output = Command::new(grep)
            .args(recursive_fgrep_args())
            .arg("--")
            .arg(needle)
            .arg(&self.path)
            .output()?;

        // grep exits 1 when nothing matched
        let code = output.status.code();
        if code != Some(0) && code != Some(1) && output.stdout.is_empty() {
            return Err(Error::CommandFailed {
                tool: "grep".to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let mut seen = HashSet::new();
        let mut files = Vec::new();
        for line in output.stdout.split(|&b| b == b'\n') {
            if line.is_empty() {
                continue;
            }
            let file = PathBuf::from(OsStr::from_bytes(line));
            let metadata = match fs::symlink_metadata(&file) {
                Ok(metadata) => metadata,
                Err(e) => {
                    debug!("Skipping vanished match {}: {}", file.display(), e);
                    continue;
                }
            };
            if metadata.file_type().is_symlink() {
                continue;
            }
            if seen.insert((metadata.dev(), metadata.ino())) {
                files.push(file);
            }
        }
        Ok(files)
    }
}

#[cfg(target_os = "macos")]
fn recursive_fgrep_args() -> &'static [&'static str] {
    &["-F", "-l", "-r", "-O"]
}

#[cfg(not(target_os = "macos"))]
fn recursive_fgrep_args() -> &'static [&'static str] {
    &["-F", "-l", "-r"]
}
