//! Page skeleton applied to converter output.
//!
//! The basic nbconvert template emits a body fragment with no `<html>`,
//! `<head>` or styling. [`PageTemplate::wrap`] turns that fragment into a
//! standalone page: charset, `<title>`, the shared stylesheet link, the
//! MathJax loader and its init block, an `<h1>` heading, the fragment, and
//! the closing tags.
//!
//! The fragment is inserted verbatim and never parsed. The stem is escaped
//! wherever it is interpolated.

use crate::config::{ArchiveConfig, PageConfig, StylesheetConfig};
use maud::{DOCTYPE, Markup, PreEscaped, html};

/// Configures inline `$...$` and display `$$...$$` math, then typesets.
const MATHJAX_INIT: &str = r#"
init_mathjax = function() {
    if (window.MathJax) {
        MathJax.Hub.Config({
            tex2jax: {
                inlineMath: [ ['$','$'], ["\\(","\\)"] ],
                displayMath: [ ['$$','$$'], ["\\[","\\]"] ]
            },
            displayAlign: 'left',
            "HTML-CSS": {
                styles: {'.MathJax_Display': {"margin": 0}}
            }
        });
        MathJax.Hub.Queue(["Typeset",MathJax.Hub]);
    }
}
init_mathjax();
"#;

/// Named slots of the page skeleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTemplate {
    /// `href` of the stylesheet link, relative to the page.
    pub stylesheet_href: String,
    /// `src` of the math renderer script.
    pub mathjax_url: String,
}

impl Default for PageTemplate {
    fn default() -> Self {
        Self::new(&StylesheetConfig::default(), &PageConfig::default())
    }
}

impl PageTemplate {
    pub fn new(stylesheet: &StylesheetConfig, page: &PageConfig) -> Self {
        Self {
            stylesheet_href: stylesheet.filename.clone(),
            mathjax_url: page.mathjax_url.clone(),
        }
    }

    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self::new(&config.stylesheet, &config.page)
    }

    /// Wrap a raw converted fragment into a complete page titled `stem`.
    pub fn wrap(&self, stem: &str, raw_html: &str) -> String {
        self.render(stem, raw_html).into_string()
    }

    fn render(&self, stem: &str, raw_html: &str) -> Markup {
        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="UTF-8";
                    title { (stem) }
                    link rel="stylesheet" href=(self.stylesheet_href) type="text/css";
                    script src=(self.mathjax_url) type="text/javascript" {}
                    script type="text/javascript" { (PreEscaped(MATHJAX_INIT)) }
                }
                body {
                    h1 { (stem) }
                    (PreEscaped(raw_html))
                }
            }
        }
    }
}
