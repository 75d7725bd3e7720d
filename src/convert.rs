//! External notebook-to-HTML conversion.
//!
//! The [`Converter`] trait is the seam between the pipeline and the
//! converter process, so pipeline tests can substitute a recording mock.
//! The production implementation is [`NbConvert`], which runs
//!
//! ```text
//! <program> <args...> <notebook>
//! ```
//!
//! with the notebook directory as its working directory, and expects
//! `<stem>.html` to appear there. The process is killed if it outlives the
//! configured timeout.

use crate::config::ConverterConfig;
use crate::scan::SourceDocument;
use std::fs;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Interval between exit-status polls of a running conversion.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Longest stderr excerpt kept in a [`ConvertError::Failed`].
const STDERR_LIMIT: usize = 2000;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("converter `{0}` not found")]
    NotFound(String),
    #[error("failed to run converter: {0}")]
    Io(#[from] std::io::Error),
    #[error("converter exited with {}: {stderr}", describe_exit(.exit_code))]
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("converter timed out after {0:?}")]
    Timeout(Duration),
    #[error("converter produced no output at {0}")]
    MissingOutput(PathBuf),
}

/// Renders one notebook to an HTML body fragment.
pub trait Converter {
    /// Convert `doc` and return the raw HTML the converter produced.
    ///
    /// `work_dir` is the notebook directory; converters that write files
    /// write them there.
    fn convert(&self, doc: &SourceDocument, work_dir: &Path) -> Result<String, ConvertError>;
}

/// Runs nbconvert (or any command with the same contract) as a subprocess.
#[derive(Debug, Clone)]
pub struct NbConvert {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl NbConvert {
    pub fn new(config: &ConverterConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// The command line that would run for `doc`, for logging.
    pub fn command_line(&self, doc: &SourceDocument) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.push(doc.filename());
        parts.join(" ")
    }

    fn run(&self, doc: &SourceDocument, work_dir: &Path) -> Result<(), ConvertError> {
        let mut stderr_file = tempfile::tempfile()?;
        let started_at = Instant::now();

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(doc.filename())
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr_file.try_clone()?))
            .spawn()
            .map_err(|err| {
                if err.kind() == ErrorKind::NotFound {
                    ConvertError::NotFound(self.program.clone())
                } else {
                    ConvertError::Io(err)
                }
            })?;

        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if started_at.elapsed() >= self.timeout {
                // The child may exit between the poll and the kill
                if let Err(err) = child.kill() {
                    debug!(stem = %doc.stem, error = %err, "kill after timeout failed");
                }
                child.wait()?;
                warn!(stem = %doc.stem, timeout = ?self.timeout, "conversion timed out");
                return Err(ConvertError::Timeout(self.timeout));
            }
            thread::sleep(POLL_INTERVAL);
        };

        debug!(
            stem = %doc.stem,
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            success = status.success(),
            "converter exited"
        );

        if !status.success() {
            let mut stderr = String::new();
            stderr_file.seek(SeekFrom::Start(0))?;
            stderr_file.read_to_string(&mut stderr)?;
            return Err(ConvertError::Failed {
                exit_code: status.code(),
                stderr: truncate_stderr(stderr.trim()),
            });
        }
        Ok(())
    }
}

impl Converter for NbConvert {
    fn convert(&self, doc: &SourceDocument, work_dir: &Path) -> Result<String, ConvertError> {
        debug!(command = %self.command_line(doc), "running converter");
        self.run(doc, work_dir)?;

        let output = work_dir.join(doc.page_filename());
        match fs::read_to_string(&output) {
            Ok(html) => Ok(html),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(ConvertError::MissingOutput(output))
            }
            Err(err) => Err(ConvertError::Io(err)),
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

/// Keep the tail of stderr: the error is usually on the last lines.
fn truncate_stderr(stderr: &str) -> String {
    if stderr.len() <= STDERR_LIMIT {
        return stderr.to_string();
    }
    let mut start = stderr.len() - STDERR_LIMIT;
    while !stderr.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &stderr[start..])
}
