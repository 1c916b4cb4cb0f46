// src/commands/inspect.rs
//! Read-only keg inspection commands

use super::open_keg;
use crate::cli::KegArgs;
use anyhow::{Context, Result};
use keg_relocate::{Locations, Relocator};

/// List files eligible for placeholder substitution
pub fn cmd_text_files(locations: Locations, args: &KegArgs) -> Result<()> {
    let keg = open_keg(args)?;
    let relocator = Relocator::new(locations);

    let files = relocator
        .relocatable_files(&keg)
        .context("Failed to classify keg files")?;
    for file in &files {
        println!("{}", keg.relative(file).display());
    }
    Ok(())
}

/// List unique files containing a literal string
pub fn cmd_grep(args: &KegArgs, needle: &str) -> Result<()> {
    let keg = open_keg(args)?;

    let files = keg
        .each_unique_file_matching(needle)
        .with_context(|| format!("Failed to search {}", keg.path().display()))?;
    for file in &files {
        println!("{}", keg.relative(file).display());
    }
    Ok(())
}
