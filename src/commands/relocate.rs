// src/commands/relocate.rs
//! Freeze, thaw and symlink relativization commands

use super::{open_keg, print_changes};
use crate::cli::KegArgs;
use anyhow::{Context, Result};
use keg_relocate::{KegLock, Locations, Relocator, ThawOptions};
use std::path::PathBuf;
use tracing::info;

/// Replace install locations in a keg with placeholders
pub fn cmd_freeze(locations: Locations, args: &KegArgs, json: bool) -> Result<()> {
    let keg = open_keg(args)?;
    let _lock = KegLock::try_acquire(keg.path())?;
    info!("Freezing keg {} ({})", keg.path().display(), keg.name());

    let relocator = Relocator::new(locations);
    let changes = relocator
        .freeze(&keg)
        .with_context(|| format!("Failed to freeze {}", keg.path().display()))?;

    print_changes(&changes, json)
}

/// Replace placeholders in a keg with install locations
pub fn cmd_thaw(
    locations: Locations,
    args: &KegArgs,
    files: Vec<PathBuf>,
    skip_linkage: bool,
    json: bool,
) -> Result<()> {
    let keg = open_keg(args)?;
    let _lock = KegLock::try_acquire(keg.path())?;
    info!("Thawing keg {} ({})", keg.path().display(), keg.name());

    let options = ThawOptions {
        files: if files.is_empty() { None } else { Some(files) },
        skip_linkage,
    };
    let relocator = Relocator::new(locations);
    let changes = relocator
        .thaw(&keg, &options)
        .with_context(|| format!("Failed to thaw {}", keg.path().display()))?;

    print_changes(&changes, json)
}

/// Relativize absolute symlinks into the prefix or cellar
pub fn cmd_relativize(locations: Locations, args: &KegArgs) -> Result<()> {
    let keg = open_keg(args)?;
    let _lock = KegLock::try_acquire(keg.path())?;

    let relocator = Relocator::new(locations);
    let rewritten = relocator
        .fix_dynamic_linkage(&keg)
        .with_context(|| format!("Failed to relativize symlinks in {}", keg.path().display()))?;

    if rewritten.is_empty() {
        println!("No symlinks needed rewriting.");
        return Ok(());
    }
    for link in &rewritten {
        println!("{}", keg.relative(link).display());
    }
    println!("\nTotal: {} symlink(s) rewritten", rewritten.len());
    Ok(())
}
