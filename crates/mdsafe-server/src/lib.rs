//! HTTP service for mdsafe.
//!
//! Exposes the rendering pipeline over a small JSON API:
//!
//! - `GET /` - service banner
//! - `GET /health` - liveness probe with a timestamp
//! - `POST /render` - `{"markdown": "..."}` in, sanitized HTML and TOC out
//!
//! # Quick Start
//!
//! ```ignore
//! use mdsafe_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         port: 8080,
//!         ..ServerConfig::default()
//!     };
//!
//!     run_server(config).await.unwrap();
//! }
//! ```

mod app;
mod error;
mod handlers;
mod middleware;
mod state;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use mdsafe_renderer::{DEFAULT_ID_PREFIX, Pipeline, RenderOptions};
use state::AppState;

pub use error::ServerError;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Largest accepted request body in bytes.
    pub max_body_bytes: usize,
    /// Prefix for generated heading ids.
    pub id_prefix: String,
    /// Enable verbose output.
    pub verbose: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 6700,
            max_body_bytes: 1024 * 1024,
            id_prefix: DEFAULT_ID_PREFIX.to_owned(),
            verbose: false,
        }
    }
}

/// Run the server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address is invalid or the listener fails.
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = Pipeline::new(RenderOptions {
        id_prefix: config.id_prefix.clone(),
    });
    let state = Arc::new(AppState {
        pipeline,
        max_body_bytes: config.max_body_bytes,
        verbose: config.verbose,
    });

    let app = app::create_router(state);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from the loaded mdsafe config.
#[must_use]
pub fn server_config_from_config(config: &mdsafe_config::Config, verbose: bool) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        max_body_bytes: config.server.max_body_bytes,
        id_prefix: config.render.id_prefix.clone(),
        verbose,
    }
}
