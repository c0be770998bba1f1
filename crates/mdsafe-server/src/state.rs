//! Application state.
//!
//! Shared state for all request handlers.

use mdsafe_renderer::Pipeline;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Rendering pipeline; stateless between calls.
    pub(crate) pipeline: Pipeline,
    /// Largest accepted request body in bytes.
    pub(crate) max_body_bytes: usize,
    /// Log successful renders.
    pub(crate) verbose: bool,
}
