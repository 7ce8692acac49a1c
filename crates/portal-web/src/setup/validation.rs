//! Configuration validation
//!
//! Validates configuration at startup to catch misconfigurations early.

use anyhow::Result;
use portal_core::Config;

pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if config.machines.is_empty() {
        tracing::warn!("MACHINES is empty - the sandbox will pick a machine for every task");
    }

    if config.routes.is_empty() {
        return Err(anyhow::anyhow!("ROUTES must list at least one route"));
    }

    if config.is_production() && config.sandbox_api_url.starts_with("http://") {
        tracing::warn!(
            sandbox_api_url = %config.sandbox_api_url,
            "Sandbox API is reached over plain HTTP in production"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_empty_routes_rejected() {
        let config = Config {
            routes: vec![],
            ..Config::default()
        };
        assert!(validate_config(&config).is_err());
    }
}
