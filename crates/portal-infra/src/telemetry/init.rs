use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

const DEFAULT_FILTER: &str = "info,portal=debug,tower_http=debug";

/// Console output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            "debug".into()
        } else {
            DEFAULT_FILTER.into()
        }
    })
}

/// Initialize tracing for a portal binary.
///
/// `RUST_LOG` wins over the defaults; `verbose` widens the default filter to
/// every target.
pub fn init_telemetry(
    service_name: &str,
    format: LogFormat,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter(verbose))
                .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
                .try_init()?;
        }
        LogFormat::Compact => {
            let console_fmt = tracing_subscriber::fmt::layer().event_format(
                Format::default()
                    .compact()
                    .with_target(false)
                    .without_time(),
            );
            tracing_subscriber::registry()
                .with(env_filter(verbose))
                .with(console_fmt)
                .try_init()?;
        }
    }

    tracing::info!(service = service_name, format = ?format, "Tracing initialized");
    Ok(())
}
