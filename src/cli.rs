// src/cli.rs
//! CLI definitions for keg-relocate
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use keg_relocate::LocationOverrides;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "keg-relocate")]
#[command(author = "Conary Project")]
#[command(version)]
#[command(about = "Make installed package kegs relocatable", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub locations: LocationArgs,

    /// Config file (default: $KEG_RELOCATE_CONFIG or ~/.config/keg-relocate/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Install location overrides shared by all commands
#[derive(Args, Debug, Clone, Default)]
pub struct LocationArgs {
    /// Install prefix
    #[arg(long, global = true)]
    pub prefix: Option<PathBuf>,

    /// Cellar holding installed kegs (default: <prefix>/Cellar)
    #[arg(long, global = true)]
    pub cellar: Option<PathBuf>,

    /// Package manager repository checkout
    #[arg(long, global = true)]
    pub repository: Option<PathBuf>,
}

impl LocationArgs {
    pub fn overrides(&self) -> LocationOverrides {
        LocationOverrides {
            prefix: self.prefix.clone(),
            cellar: self.cellar.clone(),
            repository: self.repository.clone(),
        }
    }
}

/// Keg selection shared by keg commands
#[derive(Args, Debug, Clone)]
pub struct KegArgs {
    /// Keg directory, e.g. <cellar>/foo/1.0
    pub keg: PathBuf,

    /// Package name (default: the keg's parent directory name)
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replace install locations with placeholders before packaging
    Freeze {
        #[command(flatten)]
        keg: KegArgs,

        /// Print changed files as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replace placeholders with install locations after unpacking
    Thaw {
        #[command(flatten)]
        keg: KegArgs,

        /// Only rewrite these files (relative to the keg)
        files: Vec<PathBuf>,

        /// Skip the dynamic linkage step
        #[arg(long)]
        skip_linkage: bool,

        /// Print changed files as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rewrite absolute symlinks into the prefix or cellar as relative links
    Relativize {
        #[command(flatten)]
        keg: KegArgs,
    },

    /// List files that would be considered for substitution
    TextFiles {
        #[command(flatten)]
        keg: KegArgs,
    },

    /// List unique files in a keg containing a literal string
    Grep {
        #[command(flatten)]
        keg: KegArgs,

        /// String to search for
        needle: String,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
    },
}
