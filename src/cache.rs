//! Conversion cache for repeat runs.
//!
//! Pages leave the notebook directory once they are placed, so the plain
//! "does `<stem>.html` exist here?" check would reconvert every notebook on
//! every run. The cache remembers which notebook content each archived page
//! was rendered from, letting an unchanged notebook skip conversion and
//! placement entirely.
//!
//! ## Cache keys
//!
//! Entries map a stem to the SHA-256 of its `.ipynb` contents at the time
//! the page was archived. Content-based rather than mtime-based so it
//! survives `git checkout`, which resets modification times.
//!
//! A cache hit requires:
//! 1. An entry for the stem with a matching source hash
//! 2. The archived `<stem>.html` still exists
//!
//! ## Storage
//!
//! The manifest is `<archive_dir>/.nbarchive-cache.json`, so it travels with
//! the archive it describes.
//!
//! ## Bypassing the cache
//!
//! `--no-cache` loads an empty manifest, so every notebook is reconverted.
//! `--overwrite` also reconverts, but keeps recording entries.

use crate::config::ConverterConfig;
use crate::page::PageTemplate;
use crate::scan::page_filename;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the cache manifest file within the archive directory.
const MANIFEST_FILENAME: &str = ".nbarchive-cache.json";

/// Version of the cache manifest format. Bump this to invalidate all
/// existing caches when the format or key computation changes.
const MANIFEST_VERSION: u32 = 2;

/// What an archived page was rendered from.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub source_hash: String,
    pub params_hash: String,
}

/// On-disk cache manifest mapping stems to their cache entries.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: BTreeMap<String, CacheEntry>,
}

impl CacheManifest {
    /// Create an empty manifest (used for `--no-cache` or first run).
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: BTreeMap::new(),
        }
    }

    /// Load from the archive directory. Returns an empty manifest if the
    /// file doesn't exist or can't be parsed (version mismatch, corruption).
    pub fn load(archive_dir: &Path) -> Self {
        let content = match std::fs::read_to_string(manifest_path(archive_dir)) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        let manifest: Self = match serde_json::from_str(&content) {
            Ok(m) => m,
            Err(_) => return Self::empty(),
        };
        if manifest.version != MANIFEST_VERSION {
            return Self::empty();
        }
        manifest
    }

    /// Save to the archive directory.
    pub fn save(&self, archive_dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(manifest_path(archive_dir), json)
    }

    /// Whether the archived page for `stem` was rendered from the same
    /// source with the same parameters and is still on disk.
    pub fn is_fresh(
        &self,
        stem: &str,
        source_hash: &str,
        params_hash: &str,
        archive_dir: &Path,
    ) -> bool {
        self.entries
            .get(stem)
            .is_some_and(|e| e.source_hash == source_hash && e.params_hash == params_hash)
            && archive_dir.join(page_filename(stem)).is_file()
    }

    /// Record what an archived page was rendered from.
    pub fn insert(&mut self, stem: String, source_hash: String, params_hash: String) {
        self.entries.insert(
            stem,
            CacheEntry {
                source_hash,
                params_hash,
            },
        );
    }
}

/// Resolve the cache manifest path for an archive directory.
pub fn manifest_path(archive_dir: &Path) -> PathBuf {
    archive_dir.join(MANIFEST_FILENAME)
}

/// SHA-256 hash of a file's contents, returned as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("{:x}", digest))
}

/// SHA-256 of the parameters that shape a rendered page.
///
/// Inputs: converter program and arguments, stylesheet `href`, and MathJax
/// URL. The converter timeout does not affect output and is left out.
pub fn hash_render_params(converter: &ConverterConfig, template: &PageTemplate) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"render\0");
    hasher.update(converter.program.as_bytes());
    hasher.update(b"\0");
    hasher.update((converter.args.len() as u64).to_le_bytes());
    for arg in &converter.args {
        hasher.update(arg.as_bytes());
        hasher.update(b"\0");
    }
    hasher.update(template.stylesheet_href.as_bytes());
    hasher.update(b"\0");
    hasher.update(template.mathjax_url.as_bytes());
    format!("{:x}", hasher.finalize())
}
