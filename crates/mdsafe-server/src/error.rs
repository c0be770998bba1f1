//! Error types for the HTTP server.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Rendering pipeline failed.
    #[error("Render error: {0}")]
    Render(#[from] mdsafe_renderer::RenderError),

    /// Blocking render task panicked or was cancelled.
    #[error("Render task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match &self {
            Self::Render(e) => {
                tracing::error!(error = %e, stage = ?e.stage(), "Markdown render failed");
            }
            Self::Task(e) => tracing::error!(error = %e, "Render task failed"),
        }

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"success": false, "error": "Failed to process markdown"})),
        )
            .into_response()
    }
}
