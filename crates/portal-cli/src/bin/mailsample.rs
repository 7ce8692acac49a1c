use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use portal_cli::{build_message, init_tracing, parse_relay, sample_name};

#[derive(Parser, Debug)]
#[command(name = "mailsample")]
#[command(about = "Mail a sample to the portal's SMTP front end")]
struct Args {
    /// SMTP server, host[:port]
    addr: String,
    /// Sender address; report links are tied to it
    email: String,
    /// Sample file to attach
    sample: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    if !args.sample.is_file() {
        eprintln!("Invalid sample filename given");
        std::process::exit(1);
    }

    let content = tokio::fs::read(&args.sample).await?;
    let filename = sample_name(&args.sample);
    let message = build_message(&args.email, &filename, content)?;

    let (host, port) = parse_relay(&args.addr);
    let mailer = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host.as_str())
        .port(port)
        .build();
    mailer.send(message).await?;

    tracing::info!(sample = %filename, server = %args.addr, "Sample mailed");
    Ok(())
}
