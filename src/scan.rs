//! Notebook discovery and ignore filtering.
//!
//! Scans a single directory (non-recursively) for `*.ipynb` files and
//! returns them sorted by filename. The sort order is the manifest order:
//! it decides both the order of the index links and which notebook the
//! index frameset opens by default.

use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extension of the source documents, without the dot.
pub const NOTEBOOK_EXTENSION: &str = "ipynb";

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("cannot read notebook directory {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A notebook found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceDocument {
    /// Filename without the `.ipynb` extension.
    pub stem: String,
    pub path: PathBuf,
}

impl SourceDocument {
    /// `<stem>.ipynb`
    pub fn filename(&self) -> String {
        format!("{}.{}", self.stem, NOTEBOOK_EXTENSION)
    }

    /// `<stem>.html`, the page name in both the working and archive directories.
    pub fn page_filename(&self) -> String {
        page_filename(&self.stem)
    }
}

/// `<stem>.html`
pub fn page_filename(stem: &str) -> String {
    format!("{stem}.html")
}

/// Notebooks excluded from archival.
///
/// Entries match either the notebook filename (`Template.ipynb`) or its
/// bare stem (`Template`).
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    names: HashSet<String>,
}

impl IgnoreSet {
    /// Compose the built-in defaults with user-supplied additions.
    pub fn new<I, J, S, T>(defaults: I, extra: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        let names = defaults
            .into_iter()
            .map(Into::into)
            .chain(extra.into_iter().map(Into::into))
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        Self { names }
    }

    pub fn contains(&self, stem: &str) -> bool {
        self.names.contains(stem)
            || self
                .names
                .contains(&format!("{}.{}", stem, NOTEBOOK_EXTENSION))
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// List the notebooks directly inside `dir`, sorted by filename.
///
/// Only regular files whose extension is exactly `ipynb` are returned.
/// Filenames that are not valid UTF-8 are skipped: their stem could not
/// be written into the index.
pub fn discover(dir: &Path) -> Result<Vec<SourceDocument>, ScanError> {
    let io_err = |source| ScanError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_err)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .map(|e| e == NOTEBOOK_EXTENSION)
                    .unwrap_or(false)
        })
        .collect();

    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let documents = paths
        .into_iter()
        .filter_map(|path| {
            let stem = path.file_stem()?.to_str()?.to_string();
            Some(SourceDocument { stem, path })
        })
        .collect();
    Ok(documents)
}
