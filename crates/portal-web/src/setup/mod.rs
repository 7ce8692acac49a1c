//! Application setup and initialization

pub mod routes;
pub mod server;
pub mod validation;

use crate::state::AppState;
use anyhow::{Context, Result};
use portal_api_client::SandboxClient;
use portal_core::Config;
use std::sync::Arc;

/// Build the state and router for a validated configuration.
pub fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    validation::validate_config(&config).context("Configuration validation failed")?;

    let client = SandboxClient::from_config(&config).context("Failed to create sandbox client")?;
    tracing::info!(
        sandbox_api_url = %client.base_url(),
        timeout_secs = config.sandbox_timeout_secs,
        "Sandbox client ready"
    );

    let state = Arc::new(AppState::new(config.clone(), Arc::new(client)));
    let router = routes::setup_routes(&config, state.clone());

    Ok((state, router))
}
