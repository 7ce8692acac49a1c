//! Configuration module
//!
//! All settings are read once from the environment (and an optional `.env`
//! file) into an explicit [`Config`] that is passed to every front end. There
//! is no global state.

use std::env;

// Common constants
const SANDBOX_API_URL: &str = "http://127.0.0.1:8090";
const SANDBOX_TIMEOUT_SECS: u64 = 60;
const WEB_HOST: &str = "127.0.0.1";
const WEB_PORT: u16 = 9004;
const SMTP_HOST: &str = "127.0.0.1";
const SMTP_PORT: u16 = 2525;
const SMTP_HOSTNAME: &str = "portal";
const SMTP_MAX_MESSAGE_BYTES: usize = 25 * 1024 * 1024;
const MAX_UPLOAD_MB: usize = 64;
const NOTIFY_RELAY_PORT: u16 = 587;

/// Outgoing mail relay used to send report links back to SMTP submitters.
#[derive(Clone, Debug, Default)]
pub struct NotifyConfig {
    pub enabled: bool,
    pub relay_host: Option<String>,
    pub relay_port: u16,
    pub from: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub tls: bool,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    /// Base URL of the remote sandbox API, without trailing slash.
    pub sandbox_api_url: String,
    pub sandbox_timeout_secs: u64,
    pub web_host: String,
    pub web_port: u16,
    /// Public base URL used to build report links sent by mail.
    pub public_url: String,
    pub max_upload_bytes: usize,
    pub machines: Vec<String>,
    pub routes: Vec<String>,
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Name announced in SMTP greetings.
    pub smtp_hostname: String,
    pub smtp_max_message_bytes: usize,
    pub notify: NotifyConfig,
    /// `json` for JSON log lines, anything else for compact console output.
    pub log_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            sandbox_api_url: SANDBOX_API_URL.to_string(),
            sandbox_timeout_secs: SANDBOX_TIMEOUT_SECS,
            web_host: WEB_HOST.to_string(),
            web_port: WEB_PORT,
            public_url: format!("http://{}:{}", WEB_HOST, WEB_PORT),
            max_upload_bytes: MAX_UPLOAD_MB * 1024 * 1024,
            machines: vec!["xp1".to_string(), "xp2".to_string()],
            routes: vec!["none".to_string(), "dirty".to_string(), "vpn".to_string()],
            smtp_host: SMTP_HOST.to_string(),
            smtp_port: SMTP_PORT,
            smtp_hostname: SMTP_HOSTNAME.to_string(),
            smtp_max_message_bytes: SMTP_MAX_MESSAGE_BYTES,
            notify: NotifyConfig {
                relay_port: NOTIFY_RELAY_PORT,
                tls: true,
                ..Default::default()
            },
            log_format: "compact".to_string(),
        }
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or(defaults.environment);

        let web_host = env::var("WEB_HOST").unwrap_or(defaults.web_host);
        let web_port: u16 = match env::var("WEB_PORT") {
            Ok(port) => port
                .parse()
                .map_err(|_| anyhow::anyhow!("WEB_PORT must be a valid number"))?,
            Err(_) => defaults.web_port,
        };

        let smtp_port: u16 = match env::var("SMTP_PORT") {
            Ok(port) => port
                .parse()
                .map_err(|_| anyhow::anyhow!("SMTP_PORT must be a valid number"))?,
            Err(_) => defaults.smtp_port,
        };

        let max_upload_mb = env::var("MAX_UPLOAD_MB")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(MAX_UPLOAD_MB);

        let notify = NotifyConfig {
            enabled: env::var("NOTIFY_ENABLED")
                .ok()
                .and_then(|s| parse_bool(&s))
                .unwrap_or(false),
            relay_host: env::var("NOTIFY_RELAY_HOST").ok(),
            relay_port: env::var("NOTIFY_RELAY_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(NOTIFY_RELAY_PORT),
            from: env::var("NOTIFY_FROM").ok(),
            user: env::var("NOTIFY_USER").ok(),
            password: env::var("NOTIFY_PASSWORD").ok(),
            tls: env::var("NOTIFY_TLS")
                .ok()
                .and_then(|s| parse_bool(&s))
                .unwrap_or(true),
        };

        Ok(Config {
            environment,
            sandbox_api_url: env::var("SANDBOX_API_URL")
                .unwrap_or(defaults.sandbox_api_url)
                .trim_end_matches('/')
                .to_string(),
            sandbox_timeout_secs: env::var("SANDBOX_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(SANDBOX_TIMEOUT_SECS),
            public_url: env::var("PUBLIC_URL")
                .unwrap_or_else(|_| format!("http://{}:{}", web_host, web_port))
                .trim_end_matches('/')
                .to_string(),
            web_host,
            web_port,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            machines: env::var("MACHINES")
                .map(|s| parse_list(&s))
                .unwrap_or(defaults.machines),
            routes: env::var("ROUTES")
                .map(|s| parse_list(&s))
                .unwrap_or(defaults.routes),
            smtp_host: env::var("SMTP_HOST").unwrap_or(defaults.smtp_host),
            smtp_port,
            smtp_hostname: env::var("SMTP_HOSTNAME").unwrap_or(defaults.smtp_hostname),
            smtp_max_message_bytes: env::var("SMTP_MAX_MESSAGE_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(SMTP_MAX_MESSAGE_BYTES),
            notify,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or(defaults.log_format)
                .to_lowercase(),
        })
    }

    /// Fail fast on settings that would only break at request time.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.sandbox_api_url.starts_with("http://")
            || self.sandbox_api_url.starts_with("https://"))
        {
            return Err(anyhow::anyhow!(
                "SANDBOX_API_URL must be an http(s) URL, got '{}'",
                self.sandbox_api_url
            ));
        }

        if self.sandbox_timeout_secs == 0 {
            return Err(anyhow::anyhow!("SANDBOX_TIMEOUT_SECS cannot be 0"));
        }

        if self.max_upload_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_MB cannot be 0"));
        }

        if self.smtp_max_message_bytes == 0 {
            return Err(anyhow::anyhow!("SMTP_MAX_MESSAGE_BYTES cannot be 0"));
        }

        if self.notify.enabled && (self.notify.relay_host.is_none() || self.notify.from.is_none())
        {
            return Err(anyhow::anyhow!(
                "NOTIFY_ENABLED requires NOTIFY_RELAY_HOST and NOTIFY_FROM"
            ));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn web_addr(&self) -> String {
        format!("{}:{}", self.web_host, self.web_port)
    }

    pub fn smtp_addr(&self) -> String {
        format!("{}:{}", self.smtp_host, self.smtp_port)
    }

    /// Public link to a report in the given format.
    pub fn report_url(&self, correlation_id: &str, extension: &str) -> String {
        format!("{}/report/{}.{}", self.public_url, correlation_id, extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(!config.is_production());
        assert_eq!(config.web_addr(), "127.0.0.1:9004");
        assert_eq!(config.smtp_addr(), "127.0.0.1:2525");
    }

    #[test]
    fn test_validate_rejects_bad_sandbox_url() {
        let config = Config {
            sandbox_api_url: "ftp://sandbox".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_relay_when_notify_enabled() {
        let mut config = Config::default();
        config.notify.enabled = true;
        assert!(config.validate().is_err());
        config.notify.relay_host = Some("smtp.example.com".to_string());
        config.notify.from = Some("portal@example.com".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_report_url() {
        let config = Config {
            public_url: "https://portal.example".to_string(),
            ..Config::default()
        };
        assert_eq!(
            config.report_url("abc1", "pdf"),
            "https://portal.example/report/abc1.pdf"
        );
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_list(" a, b ,,c"), vec!["a", "b", "c"]);
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
