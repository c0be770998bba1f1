//! Render API endpoint.
//!
//! Accepts markdown as JSON and returns the sanitized HTML fragment with its
//! table of contents.

use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::State;
use mdsafe_renderer::RenderOutput;
use serde::{Deserialize, Serialize};

use crate::error::ServerError;
use crate::state::AppState;

/// Request body for POST /render.
#[derive(Deserialize)]
pub(crate) struct RenderRequest {
    /// Markdown source, untrusted.
    markdown: String,
}

/// Successful response for POST /render.
#[derive(Serialize)]
pub(crate) struct RenderResponse {
    success: bool,
    data: RenderOutput,
}

/// Handle POST /render.
///
/// Rendering is CPU bound, so it runs on the blocking pool.
pub(crate) async fn render(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RenderRequest>,
) -> Result<Json<RenderResponse>, ServerError> {
    let start = Instant::now();
    let input_bytes = request.markdown.len();

    let worker = Arc::clone(&state);
    let output =
        tokio::task::spawn_blocking(move || worker.pipeline.render(&request.markdown)).await??;

    if state.verbose {
        tracing::info!(
            input_bytes,
            headings = output.toc_items.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Rendered markdown"
        );
    }

    Ok(Json(RenderResponse {
        success: true,
        data: output,
    }))
}

#[cfg(test)]
mod tests {
    use mdsafe_renderer::TocEntry;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_response_shape() {
        let response = RenderResponse {
            success: true,
            data: RenderOutput {
                html_content: "<h1 id=\"h-a\">A</h1>".to_owned(),
                toc_items: vec![TocEntry {
                    level: 1,
                    text: "A".to_owned(),
                    id: "h-a".to_owned(),
                }],
            },
        };

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({
                "success": true,
                "data": {
                    "htmlContent": "<h1 id=\"h-a\">A</h1>",
                    "tocItems": [{"level": 1, "text": "A", "id": "h-a"}],
                },
            })
        );
    }
}
