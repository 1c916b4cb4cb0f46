// src/filesystem/mod.rs

//! Filesystem operations used by relocation
//!
//! This module provides:
//! - Atomic content replacement with an in-place fallback
//! - Forced hardlink and symlink replacement
//! - Lexical path arithmetic for relativizing symlink targets

pub mod atomic;
pub mod path;

pub use atomic::{WriteMethod, force_hard_link, replace_symlink, write_file};
pub use path::{normalize, relative_path_from, resolve_in_root};
