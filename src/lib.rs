//! # nb-archive
//!
//! Batch-archives a directory of IPython notebooks as static, read-only
//! HTML pages and builds a frameset index to browse them.
//!
//! # Architecture: One Sequential Pass
//!
//! ```text
//! discover   notebooks/*.ipynb      →  sorted stems
//! filter     ignore set             →  eligible stems
//! convert    nbconvert subprocess   →  raw HTML fragment   (per notebook)
//! wrap       page skeleton          →  notebooks/<stem>.html
//! place      move into archive      →  archives/<stem>.html
//! index      frameset + file list   →  archives/index.html, archives/_index.html
//! ```
//!
//! Notebooks are handled one at a time. A notebook that fails to convert
//! or place is reported and left out of the index; the run continues.
//! Only setup failures (unreadable notebook directory, uncreatable archive
//! directory, invalid config) stop a run, and they are detected before any
//! notebook is touched.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Orchestrator: per-notebook skip/convert decision, placement, index |
//! | [`scan`] | Notebook discovery and the ignore set |
//! | [`convert`] | `Converter` trait and the nbconvert subprocess runner |
//! | [`page`] | Page skeleton wrapped around converter output |
//! | [`place`] | Moves pages into the archive, replacing same-named pages |
//! | [`index`] | Frameset and file-list pages |
//! | [`stylesheet`] | One-time fetch of the shared stylesheet |
//! | [`cache`] | Source-hash cache so unchanged notebooks are not reconverted |
//! | [`config`] | `nbarchive.toml` loading, merging, and validation |
//! | [`types`] | Per-notebook outcomes shared by pipeline and output |
//! | [`output`] | CLI run summary |
//!
//! # Design Decisions
//!
//! ## The Converter Is a Black Box
//!
//! Rendering notebooks is nbconvert's job. The archive only relies on its
//! contract: given `<stem>.ipynb`, leave `<stem>.html` in the same
//! directory and exit zero. Anything honoring that contract can be
//! configured as the converter.
//!
//! ## Explicit Paths, No `chdir`
//!
//! Every operation takes the notebook and archive directories as
//! parameters. The converter subprocess gets its working directory set on
//! its own `Command`; the process working directory is never changed.
//!
//! ## Replace, Don't Merge
//!
//! An archived page is always replaced wholesale by a newer page of the
//! same name. There are no backups and no numbered duplicates: the archive
//! holds exactly one page per notebook.

pub mod cache;
pub mod config;
pub mod convert;
pub mod index;
pub mod output;
pub mod page;
pub mod pipeline;
pub mod place;
pub mod scan;
pub mod stylesheet;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
