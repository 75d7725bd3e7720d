//! Frameset index over the archived pages.
//!
//! Two files are generated into the archive directory:
//!
//! ```text
//! archives/
//! ├── _index.html     # File list: one link per archived notebook
//! ├── index.html      # Frameset: list pane (10%) + content pane (80%)
//! ├── Analysis.html   # Default content page (first manifest entry)
//! └── Scratch.html
//! ```
//!
//! Both are regenerated wholesale on every run that asks for an index.
//! Neither may share a name with an archived page or the stylesheet:
//! writing the index would replace that file.

use crate::scan::page_filename;
use maud::{Markup, PreEscaped, html};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Frame name the list links target.
pub const CONTENT_FRAME: &str = "content";

/// Everything but RFC 3986 unreserved characters is encoded in link targets.
const HREF_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const FRAMESET_DOCTYPE: &str = "<!DOCTYPE HTML PUBLIC \"-//W3C//DTD HTML 4.01 Frameset//EN\"\n\"http://www.w3.org/TR/html4/frameset.dtd\">\n";

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("no archived notebooks to index")]
    EmptyManifest,
    #[error("index file {name} would overwrite {existing}")]
    NameCollision { name: String, existing: String },
    #[error("IO error writing index: {0}")]
    Io(#[from] std::io::Error),
}

/// Rendered index artifacts, not yet on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPages {
    pub list_filename: String,
    pub list_page: String,
    pub index_filename: String,
    pub frameset_page: String,
}

impl IndexPages {
    /// Write both pages into `archive_dir`, returning the frameset path.
    pub fn write(&self, archive_dir: &Path) -> Result<PathBuf, IndexError> {
        fs::write(archive_dir.join(&self.list_filename), &self.list_page)?;
        let index_path = archive_dir.join(&self.index_filename);
        fs::write(&index_path, &self.frameset_page)?;
        Ok(index_path)
    }
}

/// Render the file list and the frameset for `manifest`.
///
/// The frameset's content pane opens the first manifest entry, so an empty
/// manifest is an error rather than a frameset pointing nowhere. Nothing is
/// rendered if either index file would land on an archived page, the
/// stylesheet, or the other index file.
pub fn build(
    manifest: &[String],
    title: &str,
    index_filename: &str,
    list_filename: &str,
    stylesheet_filename: &str,
) -> Result<IndexPages, IndexError> {
    let first = manifest.first().ok_or(IndexError::EmptyManifest)?;
    check_names(manifest, index_filename, list_filename, stylesheet_filename)?;

    Ok(IndexPages {
        list_filename: list_filename.to_string(),
        list_page: render_list(manifest).into_string(),
        index_filename: index_filename.to_string(),
        frameset_page: render_frameset(
            title,
            &encode_href(list_filename),
            &page_href(first),
        )
        .into_string(),
    })
}

fn check_names(
    manifest: &[String],
    index_filename: &str,
    list_filename: &str,
    stylesheet_filename: &str,
) -> Result<(), IndexError> {
    let collision = |name: &str, existing: String| IndexError::NameCollision {
        name: name.to_string(),
        existing,
    };

    if index_filename == list_filename {
        return Err(collision(index_filename, "the file list".to_string()));
    }
    for name in [index_filename, list_filename] {
        if name == stylesheet_filename {
            return Err(collision(name, "the stylesheet".to_string()));
        }
        if let Some(stem) = manifest.iter().find(|stem| page_filename(stem) == name) {
            return Err(collision(name, format!("the page of notebook {stem}")));
        }
    }
    Ok(())
}

/// Percent-encoded `<stem>.html`, safe as a relative link target.
pub fn page_href(stem: &str) -> String {
    encode_href(&page_filename(stem))
}

fn encode_href(filename: &str) -> String {
    utf8_percent_encode(filename, HREF_ENCODE_SET).to_string()
}

fn render_list(manifest: &[String]) -> Markup {
    html! {
        p { b { "File list" } }
        p {
            @for stem in manifest {
                a href=(page_href(stem)) target=(CONTENT_FRAME) { (stem) }
                br;
                "\n"
            }
        }
    }
}

fn render_frameset(title: &str, list_href: &str, first_href: &str) -> Markup {
    html! {
        (PreEscaped(FRAMESET_DOCTYPE))
        html {
            head {
                title { (title) }
            }
            frameset cols="10%, 80%" {
                frame src=(list_href) name="index";
                frame src=(first_href) name=(CONTENT_FRAME);
            }
        }
    }
}
