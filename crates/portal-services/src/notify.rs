//! Mail report links back to SMTP submitters.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

use portal_core::{Config, ReportFormat};

use crate::dispatcher::BatchOutcome;

/// Sends the report links of a batch to its submitter.
/// Built only when notification is enabled and a relay is configured.
#[derive(Clone)]
pub struct ReportNotifier {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
    config: Config,
}

impl ReportNotifier {
    pub fn from_config(config: &Config) -> Option<Self> {
        let notify = &config.notify;
        if !notify.enabled {
            tracing::debug!("Report notification disabled (NOTIFY_ENABLED=false)");
            return None;
        }
        let host = notify.relay_host.as_deref()?;
        let from = notify.from.clone()?;
        let credentials = match (&notify.user, &notify.password) {
            (Some(user), Some(password)) => Some(Credentials::new(user.clone(), password.clone())),
            _ => None,
        };

        let builder = if notify.tls {
            match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host) {
                Ok(builder) => builder,
                Err(e) => {
                    tracing::error!(host = %host, error = %e, "Invalid notification relay");
                    return None;
                }
            }
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };
        let builder = builder.port(notify.relay_port);
        let builder = match credentials {
            Some(credentials) => builder.credentials(credentials),
            None => builder,
        };

        tracing::info!(
            host = %host,
            port = notify.relay_port,
            tls = notify.tls,
            "Report notifier initialized"
        );

        Some(Self {
            mailer: Arc::new(builder.build()),
            from,
            config: config.clone(),
        })
    }

    /// Report links for every accepted target and requested format.
    pub fn compose_body(config: &Config, outcome: &BatchOutcome, formats: &[ReportFormat]) -> String {
        let mut body = String::from("Your samples were submitted for analysis.\n\n");
        for accepted in &outcome.accepted {
            body.push_str(&format!("{}\n", accepted.name));
            for format in formats {
                let link = config.report_url(&accepted.correlation_id.to_string(), format.extension());
                body.push_str(&format!("  {}\n", link));
            }
        }
        for failure in &outcome.failures {
            body.push_str(&format!("{}\n", failure.message()));
        }
        body.push_str("\nReports become available once the analysis has finished.\n");
        body
    }

    pub async fn send(
        &self,
        to: &str,
        outcome: &BatchOutcome,
        formats: &[ReportFormat],
    ) -> anyhow::Result<()> {
        if outcome.accepted.is_empty() && outcome.failures.is_empty() {
            return Ok(());
        }
        let to: Mailbox = to
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid recipient '{}': {}", to, e))?;
        let from: Mailbox = self
            .from
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid NOTIFY_FROM: {}", e))?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject("Sample submission")
            .header(ContentType::TEXT_PLAIN)
            .body(Self::compose_body(&self.config, outcome, formats))?;

        self.mailer.send(email).await?;
        tracing::info!(accepted = outcome.accepted.len(), "Report links mailed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::{AcceptedTarget, TargetFailure};
    use portal_core::{new_token, CorrelationId, SubmissionError};

    #[test]
    fn test_disabled_by_default() {
        assert!(ReportNotifier::from_config(&Config::default()).is_none());
    }

    #[test]
    fn test_enabled_without_relay_is_none() {
        let mut config = Config::default();
        config.notify.enabled = true;
        assert!(ReportNotifier::from_config(&config).is_none());
    }

    #[tokio::test]
    async fn test_enabled_with_relay() {
        let mut config = Config::default();
        config.notify.enabled = true;
        config.notify.tls = false;
        config.notify.relay_host = Some("localhost".to_string());
        config.notify.from = Some("portal@example.com".to_string());
        assert!(ReportNotifier::from_config(&config).is_some());
    }

    #[test]
    fn test_compose_body_lists_links() {
        let token = new_token();
        let outcome = BatchOutcome {
            token: token.clone(),
            accepted: vec![AcceptedTarget {
                correlation_id: CorrelationId::compose(&token, 255),
                name: "a.exe".to_string(),
            }],
            failures: vec![TargetFailure {
                name: "b.exe".to_string(),
                kind: "file",
                error: SubmissionError::Network("refused".to_string()),
            }],
        };

        let config = Config {
            public_url: "https://portal.example".to_string(),
            ..Config::default()
        };
        let body = ReportNotifier::compose_body(
            &config,
            &outcome,
            &[ReportFormat::Txt, ReportFormat::Pdf],
        );
        assert!(body.contains(&format!("https://portal.example/report/{}ff.txt", token)));
        assert!(body.contains(&format!("https://portal.example/report/{}ff.pdf", token)));
        assert!(body.contains("Error submitting file: b.exe"));
    }
}
