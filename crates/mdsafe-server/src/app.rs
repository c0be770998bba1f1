//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::security;
use crate::state::AppState;

/// Create the application router.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::health::index))
        .route("/health", get(handlers::health::health))
        .route("/render", post(handlers::render::render))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(security::content_type_options_layer())
                .layer(security::frame_options_layer())
                .layer(CompressionLayer::new())
                .layer(DefaultBodyLimit::max(state.max_body_bytes)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use mdsafe_renderer::{Pipeline, RenderOptions};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    fn router_with(max_body_bytes: usize, id_prefix: &str) -> Router {
        create_router(Arc::new(AppState {
            pipeline: Pipeline::new(RenderOptions {
                id_prefix: id_prefix.to_owned(),
            }),
            max_body_bytes,
            verbose: true,
        }))
    }

    fn router() -> Router {
        router_with(1024 * 1024, "h-")
    }

    fn render_request(body: impl Into<Body>) -> Request<Body> {
        Request::post("/render")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_index() {
        let response = router()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Markdown rendering service");
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let value = body_json(response).await;
        assert_eq!(value["status"], "ok");
        assert_eq!(value["service"], "mdsafe");
    }

    #[tokio::test]
    async fn test_security_headers() {
        let response = router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "DENY");
    }

    #[tokio::test]
    async fn test_render_success() {
        let body = json!({"markdown": "# Title\n\n## Intro"});
        let response = router()
            .oneshot(render_request(body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({
                "success": true,
                "data": {
                    "htmlContent": "<h1 id=\"h-title\">Title</h1><h2 id=\"h-intro\">Intro</h2>",
                    "tocItems": [
                        {"level": 1, "text": "Title", "id": "h-title"},
                        {"level": 2, "text": "Intro", "id": "h-intro"},
                    ],
                },
            })
        );
    }

    #[tokio::test]
    async fn test_render_strips_script_tags() {
        let body = json!({"markdown": "<script>alert(1)</script>"});
        let response = router()
            .oneshot(render_request(body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let value = body_json(response).await;
        let html = value["data"]["htmlContent"].as_str().unwrap();
        assert!(!html.contains("<script"), "{html}");
    }

    #[tokio::test]
    async fn test_render_uses_configured_prefix() {
        let body = json!({"markdown": "## Setup"});
        let response = router_with(1024, "doc-")
            .oneshot(render_request(body.to_string()))
            .await
            .unwrap();

        let value = body_json(response).await;
        assert_eq!(value["data"]["tocItems"][0]["id"], "doc-setup");
    }

    #[tokio::test]
    async fn test_render_failure_is_generic_500() {
        let body = json!({"markdown": "```math\n\\frac{a}{b\n```"});
        let response = router()
            .oneshot(render_request(body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"success": false, "error": "Failed to process markdown"})
        );
    }

    #[tokio::test]
    async fn test_malformed_json_rejected() {
        let response = router()
            .oneshot(render_request("{not json"))
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_missing_markdown_field_rejected() {
        let response = router()
            .oneshot(render_request(r##"{"text": "# Hi"}"##))
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_body_limit() {
        let body = json!({"markdown": "x".repeat(256)});
        let response = router_with(64, "h-")
            .oneshot(render_request(body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
