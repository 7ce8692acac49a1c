//! Server startup and graceful shutdown

use anyhow::{Context, Result};
use axum::Router;
use portal_infra::shutdown_signal;

/// Start the server with graceful shutdown
pub async fn start_server(addr: &str, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(addr = %addr, "Server ready and accepting connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
