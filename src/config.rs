//! Archive configuration.
//!
//! Every knob the pipeline reads lives in [`ArchiveConfig`]: the archive
//! directory, the built-in ignore list, the converter command line, the
//! page template's script URL, the index title, and where the shared
//! stylesheet comes from. Nothing is read from process-wide constants; the
//! orchestrator receives a resolved config value.
//!
//! ## Config File Location
//!
//! An optional `nbarchive.toml` in the notebook directory overrides the
//! stock defaults. Command-line flags override the file.
//!
//! ```text
//! notebooks/
//! ├── nbarchive.toml           # Optional overrides
//! ├── Analysis.ipynb
//! ├── Scratch.ipynb
//! └── Template.ipynb           # Ignored by default
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! archive_dir = "archives"        # Where finished pages are moved
//! ignore = ["Template.ipynb"]     # Built-in exclusions (filenames or stems)
//!
//! [index]
//! title = "Archived ipynb file list"
//! list_filename = "_index.html"   # File-list pane of the frameset
//!
//! [converter]
//! program = "ipython"
//! args = ["nbconvert", "--to", "html", "--template", "basic"]
//! timeout_secs = 600
//!
//! [stylesheet]
//! filename = "ipython.css"
//! url = "https://github.com/mivade/ipynb-archive/raw/master/archives/ipython.css"
//! timeout_secs = 30
//!
//! [page]
//! mathjax_url = "https://c328740.ssl.cf1.rackcdn.com/mathjax/latest/MathJax.js?config=TeX-AMS_HTML"
//! ```
//!
//! Config files are sparse: override only the keys you need. Unknown keys
//! are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the optional config file inside the notebook directory.
pub const CONFIG_FILENAME: &str = "nbarchive.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Archive configuration loaded from `nbarchive.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveConfig {
    /// Directory finished pages are moved into, relative to the notebook
    /// directory unless absolute.
    pub archive_dir: String,
    /// Built-in ignore list. Entries may be filenames (`Template.ipynb`)
    /// or bare stems (`Template`).
    pub ignore: Vec<String>,
    /// Index page settings.
    pub index: IndexConfig,
    /// External converter command line.
    pub converter: ConverterConfig,
    /// Shared stylesheet cached in the archive directory.
    pub stylesheet: StylesheetConfig,
    /// Page skeleton settings.
    pub page: PageConfig,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            archive_dir: "archives".to_string(),
            ignore: vec!["Template.ipynb".to_string()],
            index: IndexConfig::default(),
            converter: ConverterConfig::default(),
            stylesheet: StylesheetConfig::default(),
            page: PageConfig::default(),
        }
    }
}

impl ArchiveConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let archive_dir = self.archive_dir.trim();
        if archive_dir.is_empty() {
            return Err(ConfigError::Validation(
                "archive_dir must not be empty".into(),
            ));
        }
        if archive_dir == "." || archive_dir == "./" {
            return Err(ConfigError::Validation(
                "archive_dir must differ from the notebook directory".into(),
            ));
        }
        if self.converter.program.trim().is_empty() {
            return Err(ConfigError::Validation(
                "converter.program must not be empty".into(),
            ));
        }
        if self.converter.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "converter.timeout_secs must be greater than zero".into(),
            ));
        }
        if self.stylesheet.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "stylesheet.timeout_secs must be greater than zero".into(),
            ));
        }
        if self.stylesheet.filename.trim().is_empty() {
            return Err(ConfigError::Validation(
                "stylesheet.filename must not be empty".into(),
            ));
        }
        if self.index.list_filename.trim().is_empty() {
            return Err(ConfigError::Validation(
                "index.list_filename must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Index page settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    /// `<title>` of the frameset page.
    pub title: String,
    /// Filename of the file-list pane.
    pub list_filename: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            title: "Archived ipynb file list".to_string(),
            list_filename: "_index.html".to_string(),
        }
    }
}

/// External converter invocation.
///
/// The source path is appended after `args`, so the default runs
/// `ipython nbconvert --to html --template basic <notebook>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Seconds before a hung conversion is killed.
    pub timeout_secs: u64,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: "ipython".to_string(),
            args: ["nbconvert", "--to", "html", "--template", "basic"]
                .into_iter()
                .map(String::from)
                .collect(),
            timeout_secs: 600,
        }
    }
}

/// Shared stylesheet location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StylesheetConfig {
    /// Filename inside the archive directory, also used as the page `href`.
    pub filename: String,
    /// Remote location fetched once when the file is absent.
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for StylesheetConfig {
    fn default() -> Self {
        Self {
            filename: "ipython.css".to_string(),
            url: "https://github.com/mivade/ipynb-archive/raw/master/archives/ipython.css"
                .to_string(),
            timeout_secs: 30,
        }
    }
}

/// Page skeleton settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageConfig {
    /// Script URL of the math renderer loaded by every page.
    pub mathjax_url: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            mathjax_url:
                "https://c328740.ssl.cf1.rackcdn.com/mathjax/latest/MathJax.js?config=TeX-AMS_HTML"
                    .to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// Base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ArchiveConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `nbarchive.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ArchiveConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ArchiveConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config for a notebook directory: stock defaults with the
/// directory's `nbarchive.toml` (if any) merged on top.
pub fn load_config(dir: &Path) -> Result<ArchiveConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `nbarchive.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# nb-archive configuration
# ========================
# All settings are optional. Values shown below are the defaults.
# Place this file as nbarchive.toml next to the notebooks you archive.
# Command-line flags take precedence over this file.
# Unknown keys will cause an error.

# Directory that receives the finished pages, relative to the notebook
# directory unless absolute. Must not be "." (the notebook directory).
archive_dir = "archives"

# Notebooks never archived. Entries may be filenames or bare stems.
# --ignore on the command line adds to this list.
ignore = ["Template.ipynb"]

# ---------------------------------------------------------------------------
# Index (written only with --index-file)
# ---------------------------------------------------------------------------
[index]
# <title> of the frameset page.
title = "Archived ipynb file list"

# File-list pane loaded in the left frame.
list_filename = "_index.html"

# ---------------------------------------------------------------------------
# Converter
# ---------------------------------------------------------------------------
[converter]
# The notebook path is appended after args. The converter must leave
# <stem>.html in the notebook directory.
program = "ipython"
args = ["nbconvert", "--to", "html", "--template", "basic"]

# A conversion running longer than this is killed and reported.
timeout_secs = 600

# ---------------------------------------------------------------------------
# Shared stylesheet (fetched once into the archive directory)
# ---------------------------------------------------------------------------
[stylesheet]
filename = "ipython.css"
url = "https://github.com/mivade/ipynb-archive/raw/master/archives/ipython.css"
timeout_secs = 30

# ---------------------------------------------------------------------------
# Page skeleton
# ---------------------------------------------------------------------------
[page]
mathjax_url = "https://c328740.ssl.cf1.rackcdn.com/mathjax/latest/MathJax.js?config=TeX-AMS_HTML"
"##
}
