//! Rendering pipeline driver.

use mdsafe_sanitize::{default_schema, sanitize};

use crate::error::RenderError;
use crate::highlight::highlight_code;
use crate::lower::lower;
use crate::math::render_math;
use crate::raw::expand_raw_html;
use crate::slug::assign_heading_ids;
use crate::toc::{TocEntry, extract_toc};

/// Default prefix for generated heading ids.
pub const DEFAULT_ID_PREFIX: &str = "h-";

/// Pipeline configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Prepended to every generated heading id.
    pub id_prefix: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            id_prefix: DEFAULT_ID_PREFIX.to_owned(),
        }
    }
}

/// Result of rendering a markdown document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct RenderOutput {
    /// Sanitized HTML fragment.
    pub html_content: String,
    /// Headings in document order.
    pub toc_items: Vec<TocEntry>,
}

/// Markdown to sanitized HTML renderer.
///
/// Stages run in a fixed order: parse and lower, raw HTML expansion, math,
/// code highlighting, heading ids, TOC extraction, sanitization and
/// serialization. Each call owns its tree and id registry, so one pipeline
/// can be shared across threads.
#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    options: RenderOptions,
}

impl Pipeline {
    /// Create a pipeline with the given options.
    #[must_use]
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Options this pipeline was built with.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render one markdown document.
    ///
    /// Either every stage succeeds or an error is returned; no partial HTML
    /// is ever produced.
    pub fn render(&self, markdown: &str) -> Result<RenderOutput, RenderError> {
        let mut tree = lower(markdown)?;
        expand_raw_html(&mut tree)?;
        render_math(&mut tree)?;
        highlight_code(&mut tree)?;
        assign_heading_ids(&mut tree, &self.options.id_prefix);
        let toc_items = extract_toc(&tree);
        sanitize(&mut tree, default_schema());

        Ok(RenderOutput {
            html_content: tree.to_html(),
            toc_items,
        })
    }
}

/// Render markdown with the default options.
pub fn render(markdown: &str) -> Result<RenderOutput, RenderError> {
    Pipeline::default().render(markdown)
}
