// src/lib.rs

//! Keg relocation
//!
//! Makes an installed package tree ("keg") portable between machines with
//! different install locations. Freezing replaces every textual reference to
//! the prefix, cellar, repository and library with placeholder tokens;
//! thawing puts this machine's locations back.
//!
//! # Architecture
//!
//! - Text files are found by `#!` sniffing plus `file(1)`; libtool files are
//!   always included
//! - Substitution is byte-level, longest match first, one write per inode
//! - Writes are atomic where possible and hardlink topology is preserved
//! - Absolute symlinks into managed roots become relative
//! - Binary load-path edits are delegated to a per-platform linkage fixer

pub mod config;
mod error;
pub mod filesystem;
pub mod keg;
pub mod lock;
pub mod relocation;

pub use config::{LocationOverrides, Locations};
pub use error::{Error, Result};
pub use keg::Keg;
pub use lock::KegLock;
pub use relocation::{
    ChangeSet, DynamicLinkageRelocator, GenericLinkage, Relocation, Relocator, TextFileClassifier,
    ThawOptions, CELLAR_PLACEHOLDER, LIBRARY_PLACEHOLDER, PREFIX_PLACEHOLDER,
    REPOSITORY_PLACEHOLDER,
};
