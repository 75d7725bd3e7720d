use clap::{Parser, Subcommand};
use nb_archive::config::{self, ArchiveConfig, ConfigError};
use nb_archive::convert::NbConvert;
use nb_archive::output;
use nb_archive::pipeline::{self, DEFAULT_INDEX_FILENAME, IndexRequest, RunOptions, SetupError};
use nb_archive::scan::IgnoreSet;
use nb_archive::stylesheet::HttpFetcher;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("NB_ARCHIVE_ON_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("NB_ARCHIVE_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "nb-archive")]
#[command(about = "Archive IPython notebooks as static HTML pages")]
#[command(long_about = "\
Archive IPython notebooks as static HTML pages

Every *.ipynb in the notebook directory is converted with nbconvert,
wrapped into a standalone page, and moved into the archive directory.
Pages already in the archive are replaced, never duplicated.

  notebooks/
  ├── nbarchive.toml          # Optional config (see gen-config)
  ├── Analysis.ipynb          # → archives/Analysis.html
  ├── Scratch.ipynb           # → archives/Scratch.html
  ├── Template.ipynb          # Ignored by default
  └── archives/
      ├── index.html          # Frameset (with --index-file)
      ├── _index.html         # File list pane
      └── ipython.css         # Shared stylesheet, fetched once

Unchanged notebooks are not reconverted on later runs; use --overwrite
to force conversion.")]
#[command(version = version_string())]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Notebook directory
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Reconvert notebooks even if their HTML already exists
    #[arg(long)]
    overwrite: bool,

    /// Directory to move archived pages to [default: archives]
    #[arg(long)]
    archive_dir: Option<String>,

    /// Write a frameset index; without a value it is named index.html
    #[arg(long, num_args = 0..=1, default_missing_value = DEFAULT_INDEX_FILENAME, value_name = "FILE")]
    index_file: Option<String>,

    /// Index page title [default: Archived ipynb file list]
    #[arg(long)]
    index_title: Option<String>,

    /// Additional notebooks to exclude (filenames or stems)
    #[arg(long, num_args = 0.., value_name = "NAME")]
    ignore: Vec<String>,

    /// Ignore the conversion cache and reconvert every notebook
    #[arg(long)]
    no_cache: bool,

    /// Print the run report as JSON instead of the text summary
    #[arg(long)]
    json: bool,

    /// Log each step (otherwise RUST_LOG, default warn)
    #[arg(long, short)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print a stock nbarchive.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Some(Command::GenConfig) = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = config::load_config(&cli.dir).map_err(SetupError::Config)?;
    let options = resolve_options(&cli, config.clone()).map_err(SetupError::Config)?;

    let converter = NbConvert::new(&config.converter);
    let fetcher = HttpFetcher::from_config(&config.stylesheet);
    let report = pipeline::run(&options, &converter, &fetcher)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_run_summary(&report);
    }
    Ok(())
}

/// `--verbose` forces `info`; otherwise honor `RUST_LOG`, defaulting to `warn`.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Layer command-line flags over the loaded config and revalidate.
fn resolve_options(cli: &Cli, mut config: ArchiveConfig) -> Result<RunOptions, ConfigError> {
    if let Some(dir) = &cli.archive_dir {
        config.archive_dir = dir.clone();
    }
    if let Some(title) = &cli.index_title {
        config.index.title = title.clone();
    }
    config.validate()?;

    let mut options = RunOptions::new(&cli.dir, &config);
    options.overwrite = cli.overwrite;
    options.use_cache = !cli.no_cache;
    options.ignore = IgnoreSet::new(&config.ignore, &cli.ignore);
    options.index = cli.index_file.as_ref().map(|filename| IndexRequest {
        filename: filename.clone(),
        title: config.index.title.clone(),
    });
    Ok(options)
}
