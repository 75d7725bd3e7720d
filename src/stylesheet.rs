//! Shared stylesheet cached in the archive directory.
//!
//! Every archived page links the same stylesheet by relative `href`. The
//! file is downloaded once, the first time an index is built into an
//! archive directory that lacks it, and reused afterwards.

use crate::config::StylesheetConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use ureq::Agent;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error fetching {url}: {message}")]
    Http { url: String, message: String },
    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: u16 },
    #[error("IO error writing stylesheet: {0}")]
    Io(#[from] std::io::Error),
}

/// Downloads a remote asset body.
pub trait StyleFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Blocking HTTP fetcher with a global timeout.
pub struct HttpFetcher {
    agent: Agent,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }

    pub fn from_config(config: &StylesheetConfig) -> Self {
        Self::new(Duration::from_secs(config.timeout_secs))
    }
}

impl StyleFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let http_err = |e: ureq::Error| FetchError::Http {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.agent.get(url).call().map_err(http_err)?;
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        response.into_body().read_to_vec().map_err(http_err)
    }
}

/// Result of [`ensure_stylesheet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StylesheetStatus {
    /// Already present; nothing fetched.
    Present(PathBuf),
    /// Downloaded this run.
    Fetched(PathBuf),
}

/// Make sure the stylesheet exists in `archive_dir`, fetching it if absent.
///
/// The body is written verbatim. A failed fetch leaves no partial file
/// behind.
pub fn ensure_stylesheet(
    archive_dir: &Path,
    config: &StylesheetConfig,
    fetcher: &impl StyleFetcher,
) -> Result<StylesheetStatus, FetchError> {
    let path = archive_dir.join(&config.filename);
    if path.exists() {
        debug!(path = %path.display(), "stylesheet present");
        return Ok(StylesheetStatus::Present(path));
    }

    info!(url = %config.url, "fetching stylesheet");
    let body = fetcher.fetch(&config.url)?;
    fs::write(&path, body)?;
    Ok(StylesheetStatus::Fetched(path))
}
