// src/relocation/mod.rs

//! Keg relocation
//!
//! Built kegs contain absolute references to the machine they were built
//! on: the install prefix, the cellar, the repository and its library
//! directory. Relocation makes a keg portable in two directions:
//!
//! - **Freeze**: real locations become placeholder tokens, before a keg is
//!   packaged for distribution
//! - **Thaw**: placeholder tokens become this machine's locations, when a
//!   packaged keg is installed
//!
//! Each direction runs the linkage step (platform binary fix-ups plus
//! symlink relativization) and then literal text substitution over the
//! keg's text and libtool files.

pub mod classify;
pub mod hardlink;
pub mod libtool;
pub mod linkage;
pub mod substitute;
pub mod symlink;

pub use classify::TextFileClassifier;
pub use hardlink::{HardlinkGroup, group_by_inode};
pub use libtool::{LIBTOOL_EXTENSIONS, libtool_files};
pub use linkage::{DynamicLinkageRelocator, GenericLinkage, platform_linkage};
pub use substitute::{ReplacementTable, replace_text_in_files};
pub use symlink::relativize;

use crate::config::Locations;
use crate::error::Result;
use crate::keg::Keg;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

pub const PREFIX_PLACEHOLDER: &str = "@@HOMEBREW_PREFIX@@";
pub const CELLAR_PLACEHOLDER: &str = "@@HOMEBREW_CELLAR@@";
pub const REPOSITORY_PLACEHOLDER: &str = "@@HOMEBREW_REPOSITORY@@";
/// Repository placeholder plus the library subpath
pub const LIBRARY_PLACEHOLDER: &str = "@@HOMEBREW_REPOSITORY@@/Library";

/// One direction of relocation: what to search for and what replaces it
///
/// Every field must be given at construction; nothing mutates a relocation
/// once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relocation {
    pub old_prefix: String,
    pub old_cellar: String,
    pub old_repository: String,
    pub old_library: String,
    pub new_prefix: String,
    pub new_cellar: String,
    pub new_repository: String,
    pub new_library: String,
}

impl Relocation {
    /// Real locations to placeholders
    pub fn to_placeholders(locations: &Locations) -> Self {
        Self {
            old_prefix: path_string(&locations.prefix),
            old_cellar: path_string(&locations.cellar),
            old_repository: path_string(&locations.repository),
            old_library: path_string(&locations.library()),
            new_prefix: PREFIX_PLACEHOLDER.to_string(),
            new_cellar: CELLAR_PLACEHOLDER.to_string(),
            new_repository: REPOSITORY_PLACEHOLDER.to_string(),
            new_library: LIBRARY_PLACEHOLDER.to_string(),
        }
    }

    /// Placeholders to real locations
    pub fn from_placeholders(locations: &Locations) -> Self {
        Self::to_placeholders(locations).reversed()
    }

    /// The same mapping in the opposite direction
    pub fn reversed(&self) -> Self {
        Self {
            old_prefix: self.new_prefix.clone(),
            old_cellar: self.new_cellar.clone(),
            old_repository: self.new_repository.clone(),
            old_library: self.new_library.clone(),
            new_prefix: self.old_prefix.clone(),
            new_cellar: self.old_cellar.clone(),
            new_repository: self.old_repository.clone(),
            new_library: self.old_library.clone(),
        }
    }

    /// Search/replacement pairs used for text substitution
    ///
    /// Prefix and cellar always take part. When the repository is the
    /// prefix, a repository match is indistinguishable from a prefix match,
    /// so the library pair is used instead of the repository pair.
    pub fn replacements(&self, repository_is_prefix: bool) -> Vec<(&str, &str)> {
        let mut pairs = vec![
            (self.old_prefix.as_str(), self.new_prefix.as_str()),
            (self.old_cellar.as_str(), self.new_cellar.as_str()),
        ];
        if repository_is_prefix {
            pairs.push((self.old_library.as_str(), self.new_library.as_str()));
        } else {
            pairs.push((self.old_repository.as_str(), self.new_repository.as_str()));
        }
        pairs
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Keg-relative paths whose content changed during a relocation
///
/// An empty change set is a successful result: nothing needed rewriting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChangeSet {
    paths: Vec<PathBuf>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a changed path, ignoring repeats
    pub fn push(&mut self, path: PathBuf) {
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }

    /// Fold another change set into this one
    pub fn merge(&mut self, other: ChangeSet) {
        let known: HashSet<PathBuf> = self.paths.iter().cloned().collect();
        self.paths
            .extend(other.paths.into_iter().filter(|p| !known.contains(p)));
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.paths.iter().any(|p| p == path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.paths.iter()
    }

    pub fn into_paths(self) -> Vec<PathBuf> {
        self.paths
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

impl FromIterator<PathBuf> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        let mut changes = Self::new();
        for path in iter {
            changes.push(path);
        }
        changes
    }
}

/// Options for thawing a keg
#[derive(Debug, Clone, Default)]
pub struct ThawOptions {
    /// Rewrite only these files (keg-relative or absolute inside the keg)
    /// instead of the classified text and libtool files
    pub files: Option<Vec<PathBuf>>,
    /// Skip the linkage step, e.g. when the caller already ran it
    pub skip_linkage: bool,
}

/// Runs freeze and thaw against kegs for one set of install locations
pub struct Relocator {
    locations: Locations,
    linkage: Box<dyn DynamicLinkageRelocator>,
    classifier: TextFileClassifier,
}

impl Relocator {
    /// Relocator using this platform's linkage fixer
    pub fn new(locations: Locations) -> Self {
        Self::with_linkage(locations, platform_linkage())
    }

    /// Relocator with an explicitly chosen linkage fixer
    pub fn with_linkage(locations: Locations, linkage: Box<dyn DynamicLinkageRelocator>) -> Self {
        Self {
            locations,
            linkage,
            classifier: TextFileClassifier::new(),
        }
    }

    pub fn locations(&self) -> &Locations {
        &self.locations
    }

    /// Replace this machine's locations with placeholders
    pub fn freeze(&self, keg: &Keg) -> Result<ChangeSet> {
        let relocation = Relocation::to_placeholders(&self.locations);

        let mut changed = self.run_linkage(keg, &relocation)?;
        let files = self.relocatable_files(keg)?;
        changed.merge(self.substitute(keg, &relocation, &files)?);

        info!(
            "Froze keg {} ({} files changed)",
            keg.path().display(),
            changed.len()
        );
        Ok(changed)
    }

    /// Replace placeholders with this machine's locations
    pub fn thaw(&self, keg: &Keg, options: &ThawOptions) -> Result<ChangeSet> {
        let relocation = Relocation::from_placeholders(&self.locations);

        let mut changed = if options.skip_linkage {
            ChangeSet::new()
        } else {
            self.run_linkage(keg, &relocation)?
        };

        let files = match &options.files {
            Some(files) => files.clone(),
            None => self.relocatable_files(keg)?,
        };
        changed.merge(self.substitute(keg, &relocation, &files)?);

        info!(
            "Thawed keg {} ({} files changed)",
            keg.path().display(),
            changed.len()
        );
        Ok(changed)
    }

    /// Generic linkage fix only: relativize absolute symlinks into the
    /// managed roots. Returns the rewritten symlinks.
    pub fn fix_dynamic_linkage(&self, keg: &Keg) -> Result<Vec<PathBuf>> {
        self.linkage.fix_dynamic_linkage(keg, &self.locations)
    }

    /// Files eligible for substitution: text files plus libtool files
    pub fn relocatable_files(&self, keg: &Keg) -> Result<Vec<PathBuf>> {
        let mut files = self.classifier.text_files(keg)?;
        let mut seen: HashSet<PathBuf> = files.iter().cloned().collect();
        for file in libtool_files(keg)? {
            if seen.insert(file.clone()) {
                files.push(file);
            }
        }
        Ok(files)
    }

    fn run_linkage(&self, keg: &Keg, relocation: &Relocation) -> Result<ChangeSet> {
        let relinked = self.linkage.fix_dynamic_linkage(keg, &self.locations)?;
        if !relinked.is_empty() {
            info!("Relativized {} symlinks", relinked.len());
        }
        self.linkage.relocate(keg, relocation)
    }

    fn substitute(&self, keg: &Keg, relocation: &Relocation, files: &[PathBuf]) -> Result<ChangeSet> {
        replace_text_in_files(
            keg,
            relocation,
            self.locations.repository_is_prefix(),
            files,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_placeholders() {
        let locations = Locations::from_prefix("/usr/local");
        let relocation = Relocation::to_placeholders(&locations);

        assert_eq!(relocation.old_prefix, "/usr/local");
        assert_eq!(relocation.old_cellar, "/usr/local/Cellar");
        assert_eq!(relocation.old_repository, "/usr/local/Homebrew");
        assert_eq!(relocation.old_library, "/usr/local/Homebrew/Library");
        assert_eq!(relocation.new_library, LIBRARY_PLACEHOLDER);
    }

    #[test]
    fn test_reversed_round_trips() {
        let relocation = Relocation::to_placeholders(&Locations::from_prefix("/opt/pkg"));
        assert_eq!(relocation.reversed().reversed(), relocation);
        assert_eq!(
            Relocation::from_placeholders(&Locations::from_prefix("/opt/pkg")).old_prefix,
            PREFIX_PLACEHOLDER
        );
    }

    #[test]
    fn test_replacements_shared_repository_uses_library() {
        let relocation = Relocation::to_placeholders(&Locations::from_prefix("/opt/pkg"));
        let pairs = relocation.replacements(true);

        assert_eq!(pairs.len(), 3);
        assert!(pairs.contains(&("/opt/pkg/Library", LIBRARY_PLACEHOLDER)));
        assert!(!pairs.iter().any(|(_, new)| *new == REPOSITORY_PLACEHOLDER));
    }

    #[test]
    fn test_replacements_separate_repository() {
        let relocation = Relocation::to_placeholders(&Locations::from_prefix("/usr/local"));
        let pairs = relocation.replacements(false);

        assert!(pairs.contains(&("/usr/local/Homebrew", REPOSITORY_PLACEHOLDER)));
        assert!(!pairs.iter().any(|(_, new)| *new == LIBRARY_PLACEHOLDER));
    }

    #[test]
    fn test_change_set_dedups() {
        let mut changes: ChangeSet = vec![PathBuf::from("a"), PathBuf::from("a")]
            .into_iter()
            .collect();
        assert_eq!(changes.len(), 1);

        let other: ChangeSet = vec![PathBuf::from("a"), PathBuf::from("b")]
            .into_iter()
            .collect();
        changes.merge(other);

        assert_eq!(changes.into_paths(), vec![PathBuf::from("a"), PathBuf::from("b")]);
    }

    #[test]
    fn test_change_set_serializes_as_list() {
        let changes: ChangeSet = vec![PathBuf::from("bin/foo")].into_iter().collect();
        assert_eq!(serde_json::to_string(&changes).unwrap(), r#"["bin/foo"]"#);
    }
}
