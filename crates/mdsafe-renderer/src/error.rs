//! Render error types.

use std::fmt;

/// Pipeline stage that can fault after the tree has been built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Re-parsing embedded HTML into element nodes.
    RawHtml,
    /// Converting math placeholders to MathML.
    Math,
    /// Syntax highlighting of code blocks.
    Highlight,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RawHtml => "raw HTML expansion",
            Self::Math => "math rendering",
            Self::Highlight => "code highlighting",
        })
    }
}

/// The markdown input could not be turned into a document tree.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Document nesting exceeds {limit} levels")]
    NestingTooDeep { limit: usize },
}

/// A transformation stage faulted on its input.
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed: {message}")]
pub struct TransformError {
    pub stage: Stage,
    pub message: String,
}

impl TransformError {
    pub(crate) fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// Error returned by [`render`](crate::render) and [`Pipeline::render`](crate::Pipeline::render).
///
/// Rendering is atomic: when this is returned no HTML was produced.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Markdown parse failed: {0}")]
    Parse(#[from] ParseError),
    #[error("Transform failed: {0}")]
    Transform(#[from] TransformError),
}

impl RenderError {
    /// Stage that faulted, if the failure happened after parsing.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Parse(_) => None,
            Self::Transform(err) => Some(err.stage),
        }
    }
}
