//! Markdown to sanitized HTML with a table of contents.
//!
//! [`render`] turns one untrusted markdown document into an HTML fragment that
//! is safe to embed, together with the document's headings:
//!
//! ```
//! let output = mdsafe_renderer::render("# Intro\n\n<script>alert(1)</script>").unwrap();
//!
//! assert!(output.html_content.starts_with(r#"<h1 id="h-intro">Intro</h1>"#));
//! assert!(!output.html_content.contains("<script"));
//! assert_eq!(output.toc_items[0].id, "h-intro");
//! ```
//!
//! Supported syntax: `CommonMark` plus tables, strikethrough, task lists,
//! footnotes, `$inline$` and `$$display$$` math, GitHub alerts
//! (`> [!NOTE]`), `:emoji:` shortcodes and embedded HTML. Fenced code with a
//! known language is syntax highlighted.
//!
//! Use [`Pipeline`] with [`RenderOptions`] to change the heading id prefix.

mod emoji;
mod error;
mod highlight;
mod lower;
mod math;
mod pipeline;
mod raw;
mod slug;
mod tex;
mod toc;

pub use error::{ParseError, RenderError, Stage, TransformError};
pub use pipeline::{DEFAULT_ID_PREFIX, Pipeline, RenderOptions, RenderOutput, render};
pub use slug::slugify;
pub use toc::{TocEntry, extract_toc};

/// Deepest element nesting accepted from markdown or embedded HTML.
///
/// Deeper documents fail with [`ParseError::NestingTooDeep`] or a
/// [`TransformError`] instead of exhausting the stack in recursive stages.
pub const MAX_NESTING_DEPTH: usize = 256;
