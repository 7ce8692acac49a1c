//! portal-web: HTTP front end of the sample submission portal.

use anyhow::Context;
use clap::Parser;
use portal_core::Config;
use portal_infra::{init_telemetry, LogFormat};

#[derive(Parser)]
#[command(name = "portal-web", about = "Sample submission web portal")]
struct Cli {
    /// Address to listen on (overrides WEB_HOST)
    host: Option<String>,
    /// Port to listen on (overrides WEB_PORT)
    port: Option<u16>,
    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(host) = cli.host {
        config.web_host = host;
    }
    if let Some(port) = cli.port {
        config.web_port = port;
    }

    init_telemetry("portal-web", LogFormat::parse(&config.log_format), cli.verbose)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment,
        "Configuration loaded"
    );

    let (_state, router) =
        portal_web::setup::initialize_app(config.clone()).context("Failed to initialize app")?;

    portal_web::setup::server::start_server(&config.web_addr(), router).await?;

    Ok(())
}
