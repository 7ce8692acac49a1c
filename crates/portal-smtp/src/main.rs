//! portal-smtp: SMTP ingestion front end of the sample submission portal.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use portal_core::Config;
use portal_infra::{init_telemetry, shutdown_signal, LogFormat};
use portal_services::{ReportNotifier, SandboxClient, SubmissionDispatcher};
use portal_smtp::{MailProcessor, SmtpServer};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "portal-smtp", about = "Sample submission SMTP server")]
struct Cli {
    /// Address to listen on (overrides SMTP_HOST)
    addr: Option<String>,
    /// Port to listen on (overrides SMTP_PORT)
    port: Option<u16>,
    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(addr) = cli.addr {
        config.smtp_host = addr;
    }
    if let Some(port) = cli.port {
        config.smtp_port = port;
    }

    init_telemetry("portal-smtp", LogFormat::parse(&config.log_format), cli.verbose)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    config.validate().context("Invalid configuration")?;

    let client = SandboxClient::from_config(&config).context("Failed to create sandbox client")?;
    let processor = MailProcessor::new(
        SubmissionDispatcher::new(Arc::new(client)),
        ReportNotifier::from_config(&config),
    );
    let server = SmtpServer::new(processor, config.smtp_hostname.clone(), config.smtp_max_message_bytes);

    let addr = config.smtp_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(addr = %addr, sandbox = %config.sandbox_api_url, "SMTP server listening");

    server.run(listener, shutdown_signal()).await
}
