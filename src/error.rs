// src/error.rs

//! Error types for keg relocation

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while relocating a keg
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Both the atomic replace and the in-place fallback failed
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to relink {} to {}: {source}", path.display(), target.display())]
    Hardlink {
        path: PathBuf,
        target: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to rewrite symlink {}: {source}", path.display())]
    Symlink {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to walk keg: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Required tool not found: {0}")]
    ToolNotFound(String),

    #[error("{tool} exited with {status}: {stderr}")]
    CommandFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid replacement pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Keg is locked by another process: {}", .0.display())]
    Locked(PathBuf),

    #[error("Invalid keg: {0}")]
    InvalidKeg(String),

    #[error("Path traversal detected: {0}")]
    PathTraversal(String),
}

/// Result type for relocation operations
pub type Result<T> = std::result::Result<T, Error>;
