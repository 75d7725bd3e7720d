//! The archival run: discover → filter → convert + wrap → place → index.
//!
//! One sequential pass over the notebook directory. Only setup problems
//! ([`SetupError`]) abort the run, and they are all detected before any
//! notebook is converted or any page moved. Everything that can go wrong
//! for a single notebook is recorded in the [`RunReport`] and the run
//! carries on with the next one.
//!
//! ## Per-notebook decision
//!
//! ```text
//! ignored?                                  → Ignored   (no side effects)
//! source gone?                              → Missing
//! <stem>.html in notebook dir, no overwrite → Existing  (placed as-is)
//! archived page fresh in cache, no overwrite→ Cached    (left in place)
//! otherwise convert + wrap                  → Converted | Failed
//! ```
//!
//! The manifest (and so the index) holds every non-ignored stem whose page
//! ends up in the archive this run: converted or existing pages that were
//! placed, plus cache hits. Order is discovery order.
//!
//! ## Partial runs
//!
//! Pages are placed one at a time. If the process dies mid-placement, the
//! pages already moved stay archived and the rest remain in the notebook
//! directory, where the next run picks them up as existing output.

use crate::cache::{self, CacheManifest};
use crate::config::{ArchiveConfig, ConverterConfig, StylesheetConfig};
use crate::convert::Converter;
use crate::index;
use crate::page::PageTemplate;
use crate::place::{self, PlaceError, PlacementReport};
use crate::scan::{self, IgnoreSet, ScanError, SourceDocument};
use crate::stylesheet::{self, StyleFetcher, StylesheetStatus};
use crate::types::FileOutcome;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default frameset filename when `--index-file` is given without a value.
pub const DEFAULT_INDEX_FILENAME: &str = "index.html";

/// Fatal errors: the run stops before touching any notebook.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),
    #[error(transparent)]
    Discover(#[from] ScanError),
    #[error(transparent)]
    ArchiveDir(#[from] PlaceError),
    #[error("archive directory {0} is the notebook directory")]
    ArchiveIsWorkDir(PathBuf),
}

/// Index generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRequest {
    /// Frameset filename inside the archive directory.
    pub filename: String,
    /// Frameset `<title>`.
    pub title: String,
}

/// Everything one run needs, resolved from config and command line.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Notebook directory; also where pages are produced before placement.
    pub work_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub overwrite: bool,
    pub use_cache: bool,
    pub ignore: IgnoreSet,
    /// `None` when no index was requested.
    pub index: Option<IndexRequest>,
    pub list_filename: String,
    pub template: PageTemplate,
    pub stylesheet: StylesheetConfig,
    /// Converter settings; only hashed here, the process is run by the `Converter`.
    pub converter: ConverterConfig,
}

impl RunOptions {
    /// Options with config defaults: no overwrite, cache on, no index.
    ///
    /// A relative `archive_dir` is resolved against `work_dir`.
    pub fn new(work_dir: &Path, config: &ArchiveConfig) -> Self {
        Self {
            work_dir: work_dir.to_path_buf(),
            archive_dir: work_dir.join(&config.archive_dir),
            overwrite: false,
            use_cache: true,
            ignore: IgnoreSet::new(&config.ignore, Vec::<String>::new()),
            index: None,
            list_filename: config.index.list_filename.clone(),
            template: PageTemplate::from_config(config),
            stylesheet: config.stylesheet.clone(),
            converter: config.converter.clone(),
        }
    }
}

/// One row of the run summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    pub stem: String,
    pub outcome: FileOutcome,
}

/// State of the index after the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IndexStatus {
    NotRequested,
    Written { path: PathBuf },
    Failed { error: String },
}

/// State of the shared stylesheet; only checked when an index is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssetStatus {
    Present,
    Fetched,
    Failed { error: String },
}

/// What a run did, notebook by notebook.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub archive_dir: PathBuf,
    /// Every discovered notebook, in discovery order.
    pub documents: Vec<DocumentReport>,
    pub placement: PlacementReport,
    /// Stems archived this run, in discovery order.
    pub manifest: Vec<String>,
    pub index: IndexStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stylesheet: Option<AssetStatus>,
}

impl RunReport {
    pub fn outcome(&self, stem: &str) -> Option<&FileOutcome> {
        self.documents
            .iter()
            .find(|d| d.stem == stem)
            .map(|d| &d.outcome)
    }

    pub fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.documents.iter().filter(|d| pred(&d.outcome)).count()
    }
}

/// Run the archival pipeline.
pub fn run(
    options: &RunOptions,
    converter: &impl Converter,
    fetcher: &impl StyleFetcher,
) -> Result<RunReport, SetupError> {
    let documents = scan::discover(&options.work_dir)?;
    info!(
        count = documents.len(),
        dir = %options.work_dir.display(),
        "discovered notebooks"
    );

    // Fail before any conversion if the archive can't exist
    place::ensure_dir(&options.archive_dir)?;
    if let (Ok(work), Ok(archive)) = (
        fs::canonicalize(&options.work_dir),
        fs::canonicalize(&options.archive_dir),
    ) && work == archive
    {
        return Err(SetupError::ArchiveIsWorkDir(options.archive_dir.clone()));
    }

    let mut cache = if options.use_cache {
        CacheManifest::load(&options.archive_dir)
    } else {
        CacheManifest::empty()
    };

    let params_hash = cache::hash_render_params(&options.converter, &options.template);
    let mut source_hashes = HashMap::new();
    let mut reports = Vec::with_capacity(documents.len());
    for doc in &documents {
        let outcome = process_document(
            doc,
            options,
            converter,
            &cache,
            &params_hash,
            &mut source_hashes,
        );
        debug!(stem = %doc.stem, outcome = outcome.label(), "processed notebook");
        reports.push(DocumentReport {
            stem: doc.stem.clone(),
            outcome,
        });
    }

    let to_place: Vec<String> = reports
        .iter()
        .filter(|r| r.outcome.needs_placement())
        .map(|r| r.stem.clone())
        .collect();
    let placement = place::place(&to_place, &options.work_dir, &options.archive_dir)?;

    for stem in &placement.placed {
        if let Some(hash) = source_hashes.remove(stem) {
            cache.insert(stem.clone(), hash, params_hash.clone());
        }
    }
    if let Err(err) = cache.save(&options.archive_dir) {
        warn!(
            path = %cache::manifest_path(&options.archive_dir).display(),
            error = %err,
            "failed to save conversion cache"
        );
    }

    let manifest: Vec<String> = reports
        .iter()
        .filter(|r| match &r.outcome {
            FileOutcome::Cached => true,
            o if o.needs_placement() => placement.is_placed(&r.stem),
            _ => false,
        })
        .map(|r| r.stem.clone())
        .collect();

    let (index, stylesheet) = match &options.index {
        Some(request) => build_index(options, request, &manifest, fetcher),
        None => (IndexStatus::NotRequested, None),
    };

    Ok(RunReport {
        archive_dir: options.archive_dir.clone(),
        documents: reports,
        placement,
        manifest,
        index,
        stylesheet,
    })
}

/// Decide and carry out the work for one notebook.
fn process_document(
    doc: &SourceDocument,
    options: &RunOptions,
    converter: &impl Converter,
    cache: &CacheManifest,
    params_hash: &str,
    source_hashes: &mut HashMap<String, String>,
) -> FileOutcome {
    if options.ignore.contains(&doc.stem) {
        debug!(stem = %doc.stem, "ignored");
        return FileOutcome::Ignored;
    }

    let source_hash = match cache::hash_file(&doc.path) {
        Ok(hash) => hash,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!(path = %doc.path.display(), "notebook disappeared before processing");
            return FileOutcome::Missing;
        }
        Err(err) => {
            warn!(path = %doc.path.display(), error = %err, "cannot read notebook");
            return FileOutcome::Failed(err.to_string());
        }
    };

    let page_path = options.work_dir.join(doc.page_filename());
    let page_existed = page_path.is_file();

    if !options.overwrite {
        if page_existed {
            source_hashes.insert(doc.stem.clone(), source_hash);
            return FileOutcome::Existing;
        }
        if options.use_cache
            && cache.is_fresh(&doc.stem, &source_hash, params_hash, &options.archive_dir)
        {
            return FileOutcome::Cached;
        }
    }

    info!(stem = %doc.stem, "converting");
    let result = converter
        .convert(doc, &options.work_dir)
        .map_err(|e| e.to_string())
        .and_then(|raw| {
            let page = options.template.wrap(&doc.stem, &raw);
            fs::write(&page_path, page).map_err(|e| e.to_string())
        });

    match result {
        Ok(()) => {
            source_hashes.insert(doc.stem.clone(), source_hash);
            FileOutcome::Converted
        }
        Err(error) => {
            warn!(stem = %doc.stem, error = %error, "conversion failed");
            // Don't let a half-written page be picked up as existing output next run
            if !page_existed
                && let Err(err) = fs::remove_file(&page_path)
                && err.kind() != ErrorKind::NotFound
            {
                warn!(path = %page_path.display(), error = %err, "cannot remove partial page");
            }
            FileOutcome::Failed(error)
        }
    }
}

fn build_index(
    options: &RunOptions,
    request: &IndexRequest,
    manifest: &[String],
    fetcher: &impl StyleFetcher,
) -> (IndexStatus, Option<AssetStatus>) {
    let pages = match index::build(
        manifest,
        &request.title,
        &request.filename,
        &options.list_filename,
        &options.stylesheet.filename,
    ) {
        Ok(pages) => pages,
        Err(err) => {
            warn!(error = %err, "index not written");
            return (
                IndexStatus::Failed {
                    error: err.to_string(),
                },
                None,
            );
        }
    };

    let asset = match stylesheet::ensure_stylesheet(
        &options.archive_dir,
        &options.stylesheet,
        fetcher,
    ) {
        Ok(StylesheetStatus::Present(_)) => AssetStatus::Present,
        Ok(StylesheetStatus::Fetched(_)) => AssetStatus::Fetched,
        Err(err) => {
            warn!(error = %err, "stylesheet unavailable; pages will render unstyled");
            AssetStatus::Failed {
                error: err.to_string(),
            }
        }
    };

    let status = match pages.write(&options.archive_dir) {
        Ok(path) => {
            info!(path = %path.display(), "wrote index");
            IndexStatus::Written { path }
        }
        Err(err) => {
            warn!(error = %err, "index not written");
            IndexStatus::Failed {
                error: err.to_string(),
            }
        }
    };
    (status, Some(asset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::ConvertError;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    fn options(dir: &Path) -> RunOptions {
        RunOptions::new(dir, &ArchiveConfig::default())
    }

    fn with_index(dir: &Path) -> RunOptions {
        RunOptions {
            index: Some(IndexRequest {
                filename: DEFAULT_INDEX_FILENAME.to_string(),
                title: "Archived ipynb file list".to_string(),
            }),
            ..options(dir)
        }
    }

    #[test]
    fn archives_notebooks_with_index() {
        let tmp = notebook_dir(&["A", "B", "Template"]);
        let opts = RunOptions {
            archive_dir: tmp.path().join("out"),
            ..with_index(tmp.path())
        };
        let converter = MockConverter::default();
        let fetcher = MockFetcher::ok("css");

        let report = run(&opts, &converter, &fetcher).unwrap();

        let out = tmp.path().join("out");
        assert_eq!(converter.calls(), vec!["A", "B"]);
        assert_eq!(report.manifest, vec!["A", "B"]);
        assert_eq!(
            list_dir(&out),
            vec![
                ".nbarchive-cache.json",
                "A.html",
                "B.html",
                "_index.html",
                "index.html",
                "ipython.css"
            ]
        );
        let list = fs::read_to_string(out.join("_index.html")).unwrap();
        assert_eq!(list.matches("<a ").count(), 2);
        assert!(list.contains("href=\"A.html\""));
        assert!(list.contains("href=\"B.html\""));
        let frameset = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(frameset.contains("<frame src=\"A.html\" name=\"content\">"));
        assert!(!tmp.path().join("Template.html").exists());
        assert!(!tmp.path().join("A.html").exists());
        assert_eq!(report.outcome("Template"), Some(&FileOutcome::Ignored));
        assert_eq!(report.stylesheet, Some(AssetStatus::Fetched));
    }

    #[test]
    fn archived_page_is_wrapped() {
        let tmp = notebook_dir(&["A"]);
        let report = run(&options(tmp.path()), &MockConverter::default(), &MockFetcher::ok(""))
            .unwrap();

        let page = fs::read_to_string(report.archive_dir.join("A.html")).unwrap();
        assert!(page.contains("<title>A</title>"));
        assert!(page.contains("<h1>A</h1><p>body of A: source of A</p></body></html>"));
    }

    #[test]
    fn second_run_is_idempotent() {
        let tmp = notebook_dir(&["A", "B"]);
        let opts = with_index(tmp.path());
        let converter = MockConverter::default();
        let fetcher = MockFetcher::ok("css");

        run(&opts, &converter, &fetcher).unwrap();
        let before = snapshot_dir(&opts.archive_dir);
        let report = run(&opts, &converter, &fetcher).unwrap();
        let after = snapshot_dir(&opts.archive_dir);

        assert_eq!(before, after);
        assert_eq!(converter.calls(), vec!["A", "B"]);
        assert_eq!(report.outcome("A"), Some(&FileOutcome::Cached));
        assert_eq!(report.manifest, vec!["A", "B"]);
        assert_eq!(fetcher.requests().len(), 1);
    }

    #[test]
    fn changed_notebook_is_reconverted() {
        let tmp = notebook_dir(&["A", "B"]);
        let opts = options(tmp.path());
        let converter = MockConverter::default();
        let fetcher = MockFetcher::ok("");

        run(&opts, &converter, &fetcher).unwrap();
        write_notebook(tmp.path(), "B", "edited");
        let report = run(&opts, &converter, &fetcher).unwrap();

        assert_eq!(converter.calls(), vec!["A", "B", "B"]);
        assert_eq!(report.outcome("B"), Some(&FileOutcome::Converted));
        assert_eq!(report.placement.replaced, vec!["B"]);
        let page = fs::read_to_string(opts.archive_dir.join("B.html")).unwrap();
        assert!(page.contains("body of B: edited"));
    }

    #[test]
    fn changed_page_config_reconverts() {
        let tmp = notebook_dir(&["A"]);
        let converter = MockConverter::default();
        let fetcher = MockFetcher::ok("");
        run(&options(tmp.path()), &converter, &fetcher).unwrap();

        let mut config = ArchiveConfig::default();
        config.page.mathjax_url = "https://new.example/mj.js".into();
        let opts = RunOptions::new(tmp.path(), &config);
        let report = run(&opts, &converter, &fetcher).unwrap();

        assert_eq!(converter.calls(), vec!["A", "A"]);
        assert_eq!(report.outcome("A"), Some(&FileOutcome::Converted));
        let page = fs::read_to_string(opts.archive_dir.join("A.html")).unwrap();
        assert!(page.contains("https://new.example/mj.js"));

        let report = run(&opts, &converter, &fetcher).unwrap();
        assert_eq!(report.outcome("A"), Some(&FileOutcome::Cached));
        assert_eq!(converter.calls().len(), 2);
    }

    #[test]
    fn changed_converter_args_reconverts() {
        let tmp = notebook_dir(&["A"]);
        let converter = MockConverter::default();
        let fetcher = MockFetcher::ok("");
        run(&options(tmp.path()), &converter, &fetcher).unwrap();

        let mut config = ArchiveConfig::default();
        config.converter.args.push("--no-input".into());
        let report = run(&RunOptions::new(tmp.path(), &config), &converter, &fetcher).unwrap();

        assert_eq!(report.outcome("A"), Some(&FileOutcome::Converted));
        assert_eq!(converter.calls(), vec!["A", "A"]);
    }

    #[test]
    fn overwrite_reconverts_everything() {
        let tmp = notebook_dir(&["A"]);
        let converter = MockConverter::default();
        let fetcher = MockFetcher::ok("");
        run(&options(tmp.path()), &converter, &fetcher).unwrap();

        let opts = RunOptions {
            overwrite: true,
            ..options(tmp.path())
        };
        run(&opts, &converter, &fetcher).unwrap();

        assert_eq!(converter.calls(), vec!["A", "A"]);
    }

    #[test]
    fn no_cache_reconverts() {
        let tmp = notebook_dir(&["A"]);
        let converter = MockConverter::default();
        let fetcher = MockFetcher::ok("");
        run(&options(tmp.path()), &converter, &fetcher).unwrap();

        let opts = RunOptions {
            use_cache: false,
            ..options(tmp.path())
        };
        let report = run(&opts, &converter, &fetcher).unwrap();

        assert_eq!(converter.calls(), vec!["A", "A"]);
        assert_eq!(report.outcome("A"), Some(&FileOutcome::Converted));
    }

    #[test]
    fn existing_output_is_placed_without_conversion() {
        let tmp = notebook_dir(&["A"]);
        fs::write(tmp.path().join("A.html"), "hand-made").unwrap();
        let converter = MockConverter::default();

        let report = run(&options(tmp.path()), &converter, &MockFetcher::ok("")).unwrap();

        assert!(converter.calls().is_empty());
        assert_eq!(report.outcome("A"), Some(&FileOutcome::Existing));
        assert_eq!(report.manifest, vec!["A"]);
        assert_eq!(
            fs::read_to_string(report.archive_dir.join("A.html")).unwrap(),
            "hand-made"
        );
        assert!(!tmp.path().join("A.html").exists());
    }

    #[test]
    fn collision_leaves_only_new_content() {
        let tmp = notebook_dir(&["foo"]);
        let archive = tmp.path().join("archives");
        fs::create_dir(&archive).unwrap();
        fs::write(archive.join("foo.html"), "A").unwrap();

        run(&options(tmp.path()), &MockConverter::default(), &MockFetcher::ok("")).unwrap();

        let page = fs::read_to_string(archive.join("foo.html")).unwrap();
        assert!(page.contains("body of foo"));
        assert_eq!(list_dir(&archive), vec![".nbarchive-cache.json", "foo.html"]);
    }

    #[test]
    fn ignored_notebooks_never_touched_even_with_overwrite() {
        let tmp = notebook_dir(&["A", "Template", "Scratch"]);
        let config = ArchiveConfig::default();
        let opts = RunOptions {
            overwrite: true,
            ignore: IgnoreSet::new(&config.ignore, ["Scratch.ipynb"]),
            ..with_index(tmp.path())
        };
        let converter = MockConverter::default();

        let report = run(&opts, &converter, &MockFetcher::ok("")).unwrap();

        assert_eq!(converter.calls(), vec!["A"]);
        assert_eq!(report.manifest, vec!["A"]);
        for stem in ["Template", "Scratch"] {
            assert_eq!(report.outcome(stem), Some(&FileOutcome::Ignored));
            assert!(!tmp.path().join(format!("{stem}.html")).exists());
            assert!(!opts.archive_dir.join(format!("{stem}.html")).exists());
        }
        let list = fs::read_to_string(opts.archive_dir.join("_index.html")).unwrap();
        assert!(!list.contains("Template"));
        assert!(!list.contains("Scratch"));
    }

    #[test]
    fn ignored_existing_output_is_not_relocated() {
        let tmp = notebook_dir(&["Template"]);
        fs::write(tmp.path().join("Template.html"), "x").unwrap();

        run(&options(tmp.path()), &MockConverter::default(), &MockFetcher::ok("")).unwrap();

        assert!(tmp.path().join("Template.html").exists());
        assert!(!tmp.path().join("archives/Template.html").exists());
    }

    #[test]
    fn failed_conversion_excluded_but_run_continues() {
        let tmp = notebook_dir(&["A", "B", "C"]);
        let converter = MockConverter::failing_on(&["B"]);

        let report = run(&with_index(tmp.path()), &converter, &MockFetcher::ok("")).unwrap();

        assert_eq!(converter.calls(), vec!["A", "B", "C"]);
        assert!(matches!(report.outcome("B"), Some(FileOutcome::Failed(_))));
        assert_eq!(report.manifest, vec!["A", "C"]);
        assert!(!report.archive_dir.join("B.html").exists());
        assert!(!tmp.path().join("B.html").exists());
        let list = fs::read_to_string(report.archive_dir.join("_index.html")).unwrap();
        assert!(!list.contains("B.html"));
    }

    #[test]
    fn vanished_notebook_is_missing_without_conversion() {
        let tmp = TempDir::new().unwrap();
        let opts = options(tmp.path());
        let doc = SourceDocument {
            stem: "gone".into(),
            path: tmp.path().join("gone.ipynb"),
        };
        let converter = MockConverter::default();
        let mut source_hashes = HashMap::new();

        let outcome = process_document(
            &doc,
            &opts,
            &converter,
            &CacheManifest::empty(),
            "params",
            &mut source_hashes,
        );

        assert_eq!(outcome, FileOutcome::Missing);
        assert!(!outcome.needs_placement());
        assert!(converter.calls().is_empty());
        assert!(source_hashes.is_empty());
        assert!(!tmp.path().join("gone.html").exists());
    }

    /// Deletes another notebook the first time it converts anything.
    struct DeletingConverter {
        inner: MockConverter,
        victim: PathBuf,
    }

    impl Converter for DeletingConverter {
        fn convert(&self, doc: &SourceDocument, work_dir: &Path) -> Result<String, ConvertError> {
            if self.victim.exists() {
                fs::remove_file(&self.victim).unwrap();
            }
            self.inner.convert(doc, work_dir)
        }
    }

    #[test]
    fn notebook_removed_mid_run_is_skipped() {
        let tmp = notebook_dir(&["A", "B", "C"]);
        let converter = DeletingConverter {
            inner: MockConverter::default(),
            victim: tmp.path().join("B.ipynb"),
        };

        let report = run(&with_index(tmp.path()), &converter, &MockFetcher::ok("")).unwrap();

        assert_eq!(report.outcome("B"), Some(&FileOutcome::Missing));
        assert_eq!(converter.inner.calls(), vec!["A", "C"]);
        assert_eq!(report.placement.placed, vec!["A", "C"]);
        assert!(report.placement.failed.is_empty());
        assert_eq!(report.manifest, vec!["A", "C"]);
        assert!(!report.archive_dir.join("B.html").exists());
        let list = fs::read_to_string(report.archive_dir.join("_index.html")).unwrap();
        assert!(!list.contains("B.html"));
    }

    #[test]
    fn notebook_named_like_index_keeps_its_page() {
        let tmp = notebook_dir(&["index", "zeta"]);
        let opts = with_index(tmp.path());
        let converter = MockConverter::default();
        let fetcher = MockFetcher::ok("css");

        let report = run(&opts, &converter, &fetcher).unwrap();

        assert_eq!(report.manifest, vec!["index", "zeta"]);
        assert!(matches!(report.index, IndexStatus::Failed { .. }));
        let page = fs::read_to_string(opts.archive_dir.join("index.html")).unwrap();
        assert!(page.contains("body of index"));
        assert!(!opts.archive_dir.join("_index.html").exists());

        let report = run(&opts, &converter, &fetcher).unwrap();
        assert_eq!(report.outcome("index"), Some(&FileOutcome::Cached));
        let page = fs::read_to_string(opts.archive_dir.join("index.html")).unwrap();
        assert!(page.contains("body of index"));
    }

    #[test]
    fn index_file_named_like_a_page_is_refused() {
        let tmp = notebook_dir(&["A", "B"]);
        let opts = RunOptions {
            index: Some(IndexRequest {
                filename: "B.html".into(),
                title: "t".into(),
            }),
            ..options(tmp.path())
        };

        let report = run(&opts, &MockConverter::default(), &MockFetcher::ok("")).unwrap();

        assert!(matches!(report.index, IndexStatus::Failed { .. }));
        let page = fs::read_to_string(opts.archive_dir.join("B.html")).unwrap();
        assert!(page.contains("body of B"));
    }

    #[test]
    fn empty_directory_reports_index_error() {
        let tmp = TempDir::new().unwrap();
        let fetcher = MockFetcher::ok("css");

        let report = run(&with_index(tmp.path()), &MockConverter::default(), &fetcher).unwrap();

        assert!(report.documents.is_empty());
        assert!(matches!(report.index, IndexStatus::Failed { .. }));
        assert!(!report.archive_dir.join("_index.html").exists());
        assert!(!report.archive_dir.join("index.html").exists());
        assert!(fetcher.requests().is_empty());
    }

    #[test]
    fn only_ignored_notebooks_reports_index_error() {
        let tmp = notebook_dir(&["Template"]);
        let report = run(
            &with_index(tmp.path()),
            &MockConverter::default(),
            &MockFetcher::ok(""),
        )
        .unwrap();
        assert!(matches!(report.index, IndexStatus::Failed { .. }));
    }

    #[test]
    fn stylesheet_failure_still_writes_index() {
        let tmp = notebook_dir(&["A"]);

        let report = run(
            &with_index(tmp.path()),
            &MockConverter::default(),
            &MockFetcher::failing(),
        )
        .unwrap();

        assert!(matches!(report.index, IndexStatus::Written { .. }));
        assert!(matches!(report.stylesheet, Some(AssetStatus::Failed { .. })));
        assert!(report.archive_dir.join("index.html").exists());
    }

    #[test]
    fn no_index_means_no_stylesheet_fetch() {
        let tmp = notebook_dir(&["A"]);
        let fetcher = MockFetcher::ok("css");

        let report = run(&options(tmp.path()), &MockConverter::default(), &fetcher).unwrap();

        assert_eq!(report.index, IndexStatus::NotRequested);
        assert_eq!(report.stylesheet, None);
        assert!(fetcher.requests().is_empty());
        assert!(!report.archive_dir.join("index.html").exists());
    }

    #[test]
    fn custom_index_filename() {
        let tmp = notebook_dir(&["A"]);
        let opts = RunOptions {
            index: Some(IndexRequest {
                filename: "home.html".into(),
                title: "Lab".into(),
            }),
            ..options(tmp.path())
        };

        let report = run(&opts, &MockConverter::default(), &MockFetcher::ok("")).unwrap();

        let path = opts.archive_dir.join("home.html");
        assert_eq!(report.index, IndexStatus::Written { path: path.clone() });
        assert!(fs::read_to_string(path).unwrap().contains("<title>Lab</title>"));
    }

    #[test]
    fn uncreatable_archive_dir_aborts_before_conversion() {
        let tmp = notebook_dir(&["A"]);
        fs::write(tmp.path().join("blocker"), "file").unwrap();
        let opts = RunOptions {
            archive_dir: tmp.path().join("blocker/archives"),
            ..options(tmp.path())
        };
        let converter = MockConverter::default();

        let result = run(&opts, &converter, &MockFetcher::ok(""));

        assert!(matches!(result, Err(SetupError::ArchiveDir(_))));
        assert!(converter.calls().is_empty());
    }

    #[test]
    fn archive_dir_resolving_to_work_dir_aborts() {
        let tmp = notebook_dir(&["A"]);
        for archive_dir in [tmp.path().to_path_buf(), tmp.path().join("archives/..")] {
            let opts = RunOptions {
                archive_dir,
                ..options(tmp.path())
            };
            let converter = MockConverter::default();

            let result = run(&opts, &converter, &MockFetcher::ok(""));

            assert!(matches!(result, Err(SetupError::ArchiveIsWorkDir(_))));
            assert!(converter.calls().is_empty());
            assert!(tmp.path().join("A.ipynb").exists());
            assert!(!tmp.path().join("A.html").exists());
        }
    }

    #[test]
    fn missing_work_dir_is_setup_error() {
        let tmp = TempDir::new().unwrap();
        let opts = options(&tmp.path().join("gone"));
        let result = run(&opts, &MockConverter::default(), &MockFetcher::ok(""));
        assert!(matches!(result, Err(SetupError::Discover(_))));
    }

    #[test]
    fn relative_archive_dir_resolves_against_work_dir() {
        let config = ArchiveConfig {
            archive_dir: "html/out".into(),
            ..ArchiveConfig::default()
        };
        let opts = RunOptions::new(Path::new("/data/notebooks"), &config);
        assert_eq!(opts.archive_dir, PathBuf::from("/data/notebooks/html/out"));
    }
}
