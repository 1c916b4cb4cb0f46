// src/config.rs

//! Install location configuration
//!
//! Relocation needs to know where the package manager lives on this machine:
//! the install prefix, the cellar holding kegs, and the repository checkout.
//! The library location is always derived from the repository.
//!
//! Locations are resolved from (lowest to highest precedence):
//! - Platform defaults
//! - A TOML config file
//! - Explicit overrides (command-line flags)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "KEG_RELOCATE_CONFIG";

/// Subpath of the repository holding the package manager's library code
pub const LIBRARY_SUBPATH: &str = "Library";

/// Real on-disk roots that relocation rewrites references to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locations {
    pub prefix: PathBuf,
    pub cellar: PathBuf,
    pub repository: PathBuf,
}

impl Locations {
    /// Build locations from a prefix, deriving cellar and repository
    pub fn from_prefix(prefix: impl Into<PathBuf>) -> Self {
        let prefix = prefix.into();
        let cellar = prefix.join("Cellar");
        let repository = default_repository(&prefix);
        Self {
            prefix,
            cellar,
            repository,
        }
    }

    /// Platform default locations
    pub fn platform_default() -> Self {
        Self::from_prefix(default_prefix())
    }

    /// Library location, always `<repository>/Library`
    pub fn library(&self) -> PathBuf {
        self.repository.join(LIBRARY_SUBPATH)
    }

    /// True when the prefix and the repository are the same directory
    ///
    /// In that layout repository references cannot be told apart from
    /// prefix references, so only library paths get their own placeholder.
    pub fn repository_is_prefix(&self) -> bool {
        self.prefix == self.repository
    }

    /// Roots an absolute symlink may point into and still be relativized
    pub fn managed_roots(&self) -> Vec<PathBuf> {
        vec![self.cellar.clone(), self.prefix.clone()]
    }

    /// Apply explicit overrides on top of these locations
    ///
    /// Overriding only the prefix re-derives the cellar and repository.
    pub fn with_overrides(mut self, overrides: &LocationOverrides) -> Result<Self> {
        if let Some(prefix) = &overrides.prefix {
            self = Self::from_prefix(prefix);
        }
        if let Some(cellar) = &overrides.cellar {
            self.cellar = cellar.clone();
        }
        if let Some(repository) = &overrides.repository {
            self.repository = repository.clone();
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        for (name, path) in [
            ("prefix", &self.prefix),
            ("cellar", &self.cellar),
            ("repository", &self.repository),
        ] {
            if !path.is_absolute() {
                return Err(Error::Config(format!(
                    "{} must be an absolute path: {}",
                    name,
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

impl Default for Locations {
    fn default() -> Self {
        Self::platform_default()
    }
}

/// Optional per-field overrides, e.g. from command-line flags
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocationOverrides {
    pub prefix: Option<PathBuf>,
    pub cellar: Option<PathBuf>,
    pub repository: Option<PathBuf>,
}

impl LocationOverrides {
    /// Layer `higher` on top of these overrides, field by field
    pub fn merge(self, higher: &LocationOverrides) -> Self {
        Self {
            prefix: higher.prefix.clone().or(self.prefix),
            cellar: higher.cellar.clone().or(self.cellar),
            repository: higher.repository.clone().or(self.repository),
        }
    }
}

/// On-disk config file layout
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub locations: LocationOverrides,
}

impl ConfigFile {
    /// Parse a config file from a TOML string
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a config file
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Resolve the config file applied to this keg's locations
    pub fn into_locations(self) -> Result<Locations> {
        Locations::platform_default().with_overrides(&self.locations)
    }
}

/// Locate the config file to use, if any
///
/// An explicit path always wins and must exist; otherwise the
/// `KEG_RELOCATE_CONFIG` variable, then the per-user config directory.
pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir()
        .map(|dir| dir.join("keg-relocate").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Load locations from config sources and apply command-line overrides
///
/// Flags win field by field: a `--prefix` flag does not discard a cellar or
/// repository the config file set explicitly.
pub fn load_locations(
    config_path: Option<&Path>,
    overrides: &LocationOverrides,
) -> Result<Locations> {
    let file = match find_config_file(config_path) {
        Some(path) => {
            debug!("Loading config from {}", path.display());
            ConfigFile::read(&path)?
        }
        None => ConfigFile::default(),
    };
    Locations::platform_default().with_overrides(&file.locations.merge(overrides))
}

fn default_prefix() -> &'static str {
    if cfg!(all(target_os = "macos", target_arch = "aarch64")) {
        "/opt/homebrew"
    } else if cfg!(target_os = "linux") {
        "/home/linuxbrew/.linuxbrew"
    } else {
        "/usr/local"
    }
}

fn default_repository(prefix: &Path) -> PathBuf {
    if prefix == Path::new("/usr/local") {
        prefix.join("Homebrew")
    } else {
        prefix.to_path_buf()
    }
}
