// src/commands/mod.rs
//! Command handlers for the keg-relocate CLI

mod inspect;
mod relocate;

pub use inspect::{cmd_grep, cmd_text_files};
pub use relocate::{cmd_freeze, cmd_relativize, cmd_thaw};

use crate::cli::KegArgs;
use anyhow::{Context, Result};
use keg_relocate::{ChangeSet, Keg};

/// Open the keg named on the command line
fn open_keg(args: &KegArgs) -> Result<Keg> {
    let keg = match &args.name {
        Some(name) => Keg::new(&args.keg, name.clone()),
        None => Keg::from_path(&args.keg),
    };
    keg.with_context(|| format!("Failed to open keg {}", args.keg.display()))
}

/// Print a change set, one path per line or as a JSON array
fn print_changes(changes: &ChangeSet, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(changes)?);
        return Ok(());
    }

    if changes.is_empty() {
        println!("No files changed.");
        return Ok(());
    }
    for path in changes {
        println!("{}", path.display());
    }
    println!("\nTotal: {} file(s) changed", changes.len());
    Ok(())
}
