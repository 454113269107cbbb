//! HTTP transport for the MCP server using rmcp's StreamableHttpService.
//!
//! Lets remote MCP clients reach the Upwind tools over HTTP instead of stdio.
//!
//! Usage: `upwind-mcp serve --http --host 0.0.0.0 --port 3000`

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpService,
};
use tower_http::cors::CorsLayer;

use crate::config::UpwindConfig;

use super::server::UpwindServer;

/// Paths the MCP endpoint is mounted at. `/sse` and `/message` keep older
/// client configurations working.
pub const MCP_PATHS: &[&str] = &["/mcp", "/sse", "/message"];

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Build the router: `/health` plus the MCP endpoint at every path in
/// [`MCP_PATHS`]. All mounts share one session table, and each session gets
/// its own clone of `server`.
pub fn router(server: UpwindServer) -> Router {
    let sessions = Arc::new(LocalSessionManager::default());

    let mut router = Router::new().route("/health", get(health));
    for path in MCP_PATHS {
        let server = server.clone();
        let service = StreamableHttpService::new(
            move || Ok(server.clone()),
            sessions.clone(),
            Default::default(),
        );
        router = router.nest_service(path, service);
    }
    router.layer(CorsLayer::permissive())
}

/// Start the MCP server over HTTP on the given address.
pub async fn run_http_server(
    config: UpwindConfig,
    addr: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let server = UpwindServer::from_config(config)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Upwind MCP server listening on http://{}/mcp", addr);
    tracing::info!("Health check available at http://{}/health", addr);

    axum::serve(listener, router(server))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutting down HTTP server");
}
