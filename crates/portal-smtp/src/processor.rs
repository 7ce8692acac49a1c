//! Turns a received message into a sandbox batch.

use portal_core::{
    encode_options, CustomMetadata, ReportFormat, SharedData, Target, TaskOptions,
};
use portal_services::{BatchOutcome, ReportNotifier, SubmissionDispatcher};

use crate::mail::decompose;
use crate::session::{Envelope, Reply};

/// Analysis options applied to every mailed sample.
fn mail_options() -> TaskOptions {
    TaskOptions::new()
        .with("procmemdump", "1")
        .with("json.calls", "0")
}

#[derive(Clone)]
pub struct MailProcessor {
    dispatcher: SubmissionDispatcher,
    notifier: Option<ReportNotifier>,
}

impl MailProcessor {
    pub fn new(dispatcher: SubmissionDispatcher, notifier: Option<ReportNotifier>) -> Self {
        Self {
            dispatcher,
            notifier,
        }
    }

    /// Submit every part of the message as one batch. Returns the reply to
    /// the DATA terminator and the batch, when the message parsed.
    pub async fn process(&self, envelope: &Envelope) -> (Reply, Option<BatchOutcome>) {
        let parsed = match decompose(&envelope.message) {
            Ok(parsed) => parsed,
            Err(error) => {
                tracing::warn!(sender = %envelope.sender, error = %error, "Rejected message");
                return (Reply::new(554, "Transaction failed: malformed message"), None);
            }
        };

        let email = if envelope.sender.is_empty() {
            parsed.from.clone().unwrap_or_default()
        } else {
            envelope.sender.clone()
        };

        let targets: Vec<Target> = parsed
            .attachments
            .into_iter()
            .map(|attachment| Target::file(attachment.filename, attachment.content))
            .collect();

        let shared = SharedData {
            options: encode_options(&mail_options()),
            ..SharedData::default()
        };
        let custom = CustomMetadata::new(email.clone(), ReportFormat::ALL.to_vec());

        let outcome = self.dispatcher.submit_batch(&targets, &shared, &custom).await;
        tracing::info!(
            sender = %email,
            attachments = targets.len(),
            accepted = outcome.accepted.len(),
            "Mail processed"
        );

        if let Some(notifier) = &self.notifier {
            if !email.is_empty() {
                let notifier = notifier.clone();
                let batch = outcome.clone();
                tokio::spawn(async move {
                    if let Err(error) = notifier.send(&email, &batch, &ReportFormat::ALL).await {
                        tracing::warn!(error = %error, "Failed to mail report links");
                    }
                });
            }
        }

        let reply = Reply::new(
            250,
            format!(
                "Ok: {} of {} parts submitted",
                outcome.accepted.len(),
                outcome.attempted()
            ),
        );
        (reply, Some(outcome))
    }
}
