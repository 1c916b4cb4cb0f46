// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use keg_relocate::{GenericLinkage, Keg, Locations, Relocator};
use std::fs;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A prefix with a cellar and one keg, all inside a temp directory.
///
/// Keep the struct alive to prevent cleanup.
pub struct Fixture {
    pub temp_dir: TempDir,
    pub locations: Locations,
    pub keg: Keg,
}

impl Fixture {
    /// Prefix `<tmp>/pkg`, repository shared with the prefix
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let locations = Locations::from_prefix(temp_dir.path().join("pkg"));
        Self::with_locations(temp_dir, locations)
    }

    /// Prefix `<tmp>/pkg`, repository at `<tmp>/repo`
    pub fn with_separate_repository() -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let prefix = temp_dir.path().join("pkg");
        let locations = Locations {
            cellar: prefix.join("Cellar"),
            repository: temp_dir.path().join("repo"),
            prefix,
        };
        Self::with_locations(temp_dir, locations)
    }

    fn with_locations(temp_dir: TempDir, locations: Locations) -> Self {
        let root = locations.cellar.join("foo/1.0");
        for dir in ["bin", "lib", "share", ".brew"] {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
        let keg = Keg::from_path(&root).unwrap();
        Self {
            temp_dir,
            locations,
            keg,
        }
    }

    pub fn relocator(&self) -> Relocator {
        Relocator::with_linkage(self.locations.clone(), Box::new(GenericLinkage))
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.keg.path().join(relative)
    }

    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        fs::write(&path, content).unwrap();
        path
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative)).unwrap()
    }

    pub fn prefix(&self) -> String {
        self.locations.prefix.display().to_string()
    }

    pub fn cellar(&self) -> String {
        self.locations.cellar.display().to_string()
    }

    pub fn repository(&self) -> String {
        self.locations.repository.display().to_string()
    }
}

pub fn inode(path: &Path) -> (u64, u64) {
    let metadata = fs::metadata(path).unwrap();
    (metadata.dev(), metadata.ino())
}

/// Make `dir` read-only; false when the process can write to it anyway
/// (e.g. running as root), in which case the mode is restored
pub fn make_read_only(dir: &Path) -> bool {
    fs::set_permissions(dir, fs::Permissions::from_mode(0o555)).unwrap();
    let check = dir.join(".write-check");
    if fs::write(&check, b"").is_ok() {
        fs::remove_file(&check).unwrap();
        make_writable(dir);
        return false;
    }
    true
}

pub fn make_writable(dir: &Path) {
    fs::set_permissions(dir, fs::Permissions::from_mode(0o755)).unwrap();
}
