// src/relocation/linkage.rs

//! Dynamic linkage relocation
//!
//! Compiled binaries embed library load paths that plain text substitution
//! must not touch. Fixing those is platform specific, so it sits behind
//! [`DynamicLinkageRelocator`]. The generic implementation only relativizes
//! symlinks; a platform that needs binary edits supplies its own and
//! [`platform_linkage`] picks it once, when the relocator is built.

use super::symlink::relativize;
use super::{ChangeSet, Relocation};
use crate::config::Locations;
use crate::error::Result;
use crate::keg::Keg;
use std::path::PathBuf;

/// Platform-specific fix-ups for load paths inside binaries
pub trait DynamicLinkageRelocator: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Rewrite embedded load paths from `relocation`'s old values to its
    /// new values. Returns keg-relative paths of the binaries changed.
    fn relocate(&self, keg: &Keg, relocation: &Relocation) -> Result<ChangeSet>;

    /// Fix linkage that does not involve binary edits
    ///
    /// By default this relativizes absolute symlinks into the cellar or
    /// prefix, returning the symlinks rewritten.
    fn fix_dynamic_linkage(&self, keg: &Keg, locations: &Locations) -> Result<Vec<PathBuf>> {
        relativize(keg.path(), &locations.managed_roots())
    }
}

/// Linkage fixer for platforms where symlink relativization suffices
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericLinkage;

impl DynamicLinkageRelocator for GenericLinkage {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn relocate(&self, _keg: &Keg, _relocation: &Relocation) -> Result<ChangeSet> {
        Ok(ChangeSet::new())
    }
}

/// The linkage fixer for the platform this binary was built for
pub fn platform_linkage() -> Box<dyn DynamicLinkageRelocator> {
    Box::new(GenericLinkage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    #[test]
    fn test_generic_relocate_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let keg = Keg::new(temp_dir.path(), "foo").unwrap();
        let relocation = Relocation::to_placeholders(&Locations::from_prefix("/opt/pkg"));

        let changed = GenericLinkage.relocate(&keg, &relocation).unwrap();

        assert!(changed.is_empty());
        assert_eq!(platform_linkage().name(), "generic");
    }

    #[test]
    fn test_default_fix_relativizes_symlinks() {
        let temp_dir = TempDir::new().unwrap();
        let prefix = temp_dir.path().to_path_buf();
        let keg_root = prefix.join("Cellar/foo/1.0");
        fs::create_dir_all(keg_root.join("bin")).unwrap();
        symlink(prefix.join("bin/tool"), keg_root.join("bin/tool")).unwrap();
        let keg = Keg::from_path(&keg_root).unwrap();

        let fixed = GenericLinkage
            .fix_dynamic_linkage(&keg, &Locations::from_prefix(&prefix))
            .unwrap();

        assert_eq!(fixed, vec![keg_root.join("bin/tool")]);
        assert!(fs::read_link(keg_root.join("bin/tool")).unwrap().is_relative());
    }
}
