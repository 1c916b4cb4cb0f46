// src/relocation/libtool.rs

//! Libtool metadata files
//!
//! `.la` and `.lai` archives are always text and always embed the build
//! prefix, so they are relocated without asking `file(1)`.

use crate::error::Result;
use crate::keg::Keg;
use std::ffi::OsStr;
use std::path::PathBuf;

pub const LIBTOOL_EXTENSIONS: &[&str] = &["la", "lai"];

/// Every regular libtool file under the keg
pub fn libtool_files(keg: &Keg) -> Result<Vec<PathBuf>> {
    Ok(keg
        .regular_files()?
        .into_iter()
        .filter(|path| {
            path.extension()
                .and_then(OsStr::to_str)
                .is_some_and(|ext| LIBTOOL_EXTENSIONS.contains(&ext))
        })
        .collect())
}
