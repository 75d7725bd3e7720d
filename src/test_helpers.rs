//! Shared test utilities for the nb-archive test suite.
//!
//! Provides a notebook-directory fixture plus recording mocks for the two
//! external collaborators (the converter process and the stylesheet fetch).
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = notebook_dir(&["A", "B", "Template"]);
//! let converter = MockConverter::default();
//! let fetcher = MockFetcher::ok("css");
//! // ... run the pipeline against tmp.path()
//! assert_eq!(converter.calls(), vec!["A", "B"]);
//! ```

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::convert::{ConvertError, Converter};
use crate::scan::SourceDocument;
use crate::stylesheet::{FetchError, StyleFetcher};

// =========================================================================
// Fixture setup
// =========================================================================

/// A temp directory holding one `<stem>.ipynb` per stem.
pub fn notebook_dir(stems: &[&str]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for stem in stems {
        write_notebook(tmp.path(), stem, &format!("source of {stem}"));
    }
    tmp
}

/// Write a notebook with the given content.
pub fn write_notebook(dir: &Path, stem: &str, content: &str) {
    fs::write(dir.join(format!("{stem}.ipynb")), content).unwrap();
}

/// Sorted file names in a directory.
pub fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Read every file in a directory into `(name, content)` pairs, sorted.
pub fn snapshot_dir(dir: &Path) -> Vec<(String, String)> {
    list_dir(dir)
        .into_iter()
        .map(|name| {
            let content = fs::read_to_string(dir.join(&name)).unwrap();
            (name, content)
        })
        .collect()
}

// =========================================================================
// Mock converter
// =========================================================================

/// Converter that records calls and returns `<p>body of STEM: SOURCE</p>`
/// without spawning anything.
#[derive(Default)]
pub struct MockConverter {
    calls: RefCell<Vec<String>>,
    failing: HashSet<String>,
}

impl MockConverter {
    /// Fail conversion for the listed stems.
    pub fn failing_on(stems: &[&str]) -> Self {
        Self {
            calls: RefCell::default(),
            failing: stems.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Stems converted so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl Converter for MockConverter {
    fn convert(&self, doc: &SourceDocument, _work_dir: &Path) -> Result<String, ConvertError> {
        self.calls.borrow_mut().push(doc.stem.clone());
        if self.failing.contains(&doc.stem) {
            return Err(ConvertError::Failed {
                exit_code: Some(1),
                stderr: format!("cannot convert {}", doc.stem),
            });
        }
        let source = fs::read_to_string(&doc.path)?;
        Ok(format!("<p>body of {}: {}</p>", doc.stem, source))
    }
}

// =========================================================================
// Mock fetcher
// =========================================================================

/// Fetcher that returns a fixed body (or fails) and records requested URLs.
pub struct MockFetcher {
    body: Option<String>,
    requests: RefCell<Vec<String>>,
}

impl MockFetcher {
    pub fn ok(body: &str) -> Self {
        Self {
            body: Some(body.to_string()),
            requests: RefCell::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            body: None,
            requests: RefCell::default(),
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl StyleFetcher for MockFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.requests.borrow_mut().push(url.to_string());
        match &self.body {
            Some(body) => Ok(body.clone().into_bytes()),
            None => Err(FetchError::Http {
                url: url.to_string(),
                message: "connection refused".to_string(),
            }),
        }
    }
}
