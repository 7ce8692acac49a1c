//! Submission dispatcher.
//!
//! Sends each target to the sandbox with the batch token embedded in its
//! custom metadata and turns the returned task id into a [`CorrelationId`].
//! Batches are processed sequentially; a failed target is recorded and the
//! remaining targets are still submitted.

use std::sync::Arc;

use bytes::Bytes;
use portal_api_client::SandboxBackend;
use portal_core::{
    encode_custom, new_token, CorrelationId, CustomMetadata, SharedData, SubmissionError,
    SubmissionToken, Target,
};

/// A target the sandbox accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedTarget {
    pub correlation_id: CorrelationId,
    pub name: String,
}

/// A target the sandbox did not accept.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetFailure {
    pub name: String,
    /// `file` or `URL`.
    pub kind: &'static str,
    pub error: SubmissionError,
}

impl TargetFailure {
    /// Message shown to the submitter.
    pub fn message(&self) -> String {
        format!("Error submitting {}: {}", self.kind, self.name)
    }
}

/// Result of submitting one batch.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub token: SubmissionToken,
    pub accepted: Vec<AcceptedTarget>,
    pub failures: Vec<TargetFailure>,
}

impl BatchOutcome {
    pub fn attempted(&self) -> usize {
        self.accepted.len() + self.failures.len()
    }

    /// Targets were given but none was accepted.
    pub fn all_failed(&self) -> bool {
        self.accepted.is_empty() && !self.failures.is_empty()
    }
}

#[derive(Clone)]
pub struct SubmissionDispatcher {
    backend: Arc<dyn SandboxBackend>,
}

impl SubmissionDispatcher {
    pub fn new(backend: Arc<dyn SandboxBackend>) -> Self {
        Self { backend }
    }

    fn task_fields(
        shared: &SharedData,
        custom: &CustomMetadata,
        token: &SubmissionToken,
    ) -> Result<Vec<(&'static str, String)>, SubmissionError> {
        let mut custom = custom.clone();
        custom.uniqid = Some(token.as_str().to_string());
        let encoded = encode_custom(&custom).map_err(|e| SubmissionError::Decode(e.to_string()))?;

        let mut fields = shared.form_fields();
        fields.push(("custom", encoded));
        Ok(fields)
    }

    #[tracing::instrument(skip(self, content, shared, custom, token), fields(size = content.len()))]
    pub async fn submit_file(
        &self,
        content: Bytes,
        filename: &str,
        shared: &SharedData,
        custom: &CustomMetadata,
        token: &SubmissionToken,
    ) -> Result<CorrelationId, SubmissionError> {
        let fields = Self::task_fields(shared, custom, token)?;
        let task_id = self
            .backend
            .create_file_task(filename, content, &fields)
            .await?;

        tracing::info!(task_id, filename = %filename, "File submitted");
        Ok(CorrelationId::compose(token, task_id))
    }

    #[tracing::instrument(skip(self, shared, custom, token))]
    pub async fn submit_url(
        &self,
        url: &str,
        shared: &SharedData,
        custom: &CustomMetadata,
        token: &SubmissionToken,
    ) -> Result<CorrelationId, SubmissionError> {
        let fields = Self::task_fields(shared, custom, token)?;
        let task_id = self.backend.create_url_task(url, &fields).await?;

        tracing::info!(task_id, url = %url, "URL submitted");
        Ok(CorrelationId::compose(token, task_id))
    }

    pub async fn submit_target(
        &self,
        target: &Target,
        shared: &SharedData,
        custom: &CustomMetadata,
        token: &SubmissionToken,
    ) -> Result<CorrelationId, SubmissionError> {
        match target {
            Target::File { filename, content } => {
                self.submit_file(content.clone(), filename, shared, custom, token)
                    .await
            }
            Target::Url(url) => self.submit_url(url, shared, custom, token).await,
        }
    }

    /// Submit every target under one freshly minted token.
    pub async fn submit_batch(
        &self,
        targets: &[Target],
        shared: &SharedData,
        custom: &CustomMetadata,
    ) -> BatchOutcome {
        let token = new_token();
        let mut accepted = Vec::new();
        let mut failures = Vec::new();

        for target in targets {
            match self.submit_target(target, shared, custom, &token).await {
                Ok(correlation_id) => accepted.push(AcceptedTarget {
                    correlation_id,
                    name: target.display_name().to_string(),
                }),
                Err(error) => {
                    tracing::warn!(
                        target_kind = target.kind(),
                        name = %target.display_name(),
                        error_kind = error.kind(),
                        error = %error,
                        "Target submission failed"
                    );
                    failures.push(TargetFailure {
                        name: target.display_name().to_string(),
                        kind: target.kind(),
                        error,
                    });
                }
            }
        }

        tracing::info!(
            accepted = accepted.len(),
            failed = failures.len(),
            "Batch submitted"
        );

        BatchOutcome {
            token,
            accepted,
            failures,
        }
    }
}
