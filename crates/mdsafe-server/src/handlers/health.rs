//! Service banner and health endpoints.

use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// Response for GET /health.
#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
    service: &'static str,
    /// Current time (RFC 3339).
    timestamp: String,
}

/// Handle GET /.
pub(crate) async fn index() -> &'static str {
    "Markdown rendering service"
}

/// Handle GET /health.
pub(crate) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "mdsafe",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}
