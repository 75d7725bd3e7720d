//! Relocation of finished pages into the archive directory.
//!
//! A page replaces any archived page of the same name: the old file is
//! removed, then the new one moved in. Nothing is merged, renamed, or
//! backed up. Each page is placed independently; a failure is recorded and
//! the remaining pages are still placed.

use crate::scan::page_filename;
use serde::Serialize;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum PlaceError {
    #[error("cannot create archive directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("cannot remove stale {path}: {source}")]
    Remove { path: PathBuf, source: io::Error },
    #[error("cannot move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
}

/// Per-stem placement results, in input order.
#[derive(Debug, Default, Serialize)]
pub struct PlacementReport {
    /// Stems now present in the archive directory.
    pub placed: Vec<String>,
    /// Stems whose page replaced an older archived page.
    pub replaced: Vec<String>,
    /// Stems that could not be placed, with the reason.
    pub failed: Vec<(String, String)>,
}

impl PlacementReport {
    pub fn is_placed(&self, stem: &str) -> bool {
        self.placed.iter().any(|s| s == stem)
    }
}

/// Create `to_dir` (and parents) if missing.
pub fn ensure_dir(to_dir: &Path) -> Result<(), PlaceError> {
    fs::create_dir_all(to_dir).map_err(|source| PlaceError::CreateDir {
        path: to_dir.to_path_buf(),
        source,
    })
}

/// Move `<stem>.html` for each stem from `from_dir` into `to_dir`.
///
/// Fails as a whole only if `to_dir` cannot be created, before any page is
/// touched.
pub fn place(
    stems: &[String],
    from_dir: &Path,
    to_dir: &Path,
) -> Result<PlacementReport, PlaceError> {
    ensure_dir(to_dir)?;

    let mut report = PlacementReport::default();
    for stem in stems {
        match place_one(stem, from_dir, to_dir) {
            Ok(replaced) => {
                info!(stem = %stem, replaced, "placed page");
                if replaced {
                    report.replaced.push(stem.clone());
                }
                report.placed.push(stem.clone());
            }
            Err(err) => {
                warn!(stem = %stem, error = %err, "placement failed");
                report.failed.push((stem.clone(), err.to_string()));
            }
        }
    }
    Ok(report)
}

/// Returns whether an older archived page was replaced.
fn place_one(stem: &str, from_dir: &Path, to_dir: &Path) -> Result<bool, PlaceError> {
    let filename = page_filename(stem);
    let from = from_dir.join(&filename);
    let to = to_dir.join(&filename);

    // Check the source first so a missing page never deletes its archived copy
    if !from.is_file() {
        return Err(PlaceError::Move {
            from,
            to,
            source: io::Error::new(ErrorKind::NotFound, "page not found"),
        });
    }

    let replaced = match fs::remove_file(&to) {
        Ok(()) => true,
        Err(err) if err.kind() == ErrorKind::NotFound => false,
        Err(source) => return Err(PlaceError::Remove { path: to, source }),
    };

    move_file(&from, &to).map_err(|source| PlaceError::Move {
        from: from.clone(),
        to: to.clone(),
        source,
    })?;
    Ok(replaced)
}

/// Rename, falling back to copy + remove when the archive is on another
/// filesystem.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(err) => {
            debug!(error = %err, "rename failed, copying instead");
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
    }
}
