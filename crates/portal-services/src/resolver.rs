//! Report resolver.
//!
//! Turns a correlation id and a requested extension into a rendered report.
//! Access control is the token check alone: the first 32 characters of the
//! correlation id must equal the `uniqid` stored in the task's custom
//! metadata.

use std::sync::Arc;

use portal_api_client::{FetchError, ReportFetch, SandboxBackend};
use portal_core::models::{parse_task_id, token_part};
use portal_core::{RenderedReport, ReportError, ReportFormat, SubmissionToken};
use serde_json::Value;

use crate::render::renderer_for;

/// Result of a report lookup that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    Ready(RenderedReport),
    /// The sandbox has not finished the task yet.
    Pending,
}

#[derive(Clone)]
pub struct ReportResolver {
    backend: Arc<dyn SandboxBackend>,
}

/// The `uniqid` stored in the task's custom metadata. Only the JSON shape is
/// checked; other keys (email, reports) may hold anything.
fn embedded_uniqid(report: &Value) -> Result<Option<String>, ReportError> {
    let raw = report["info"]["custom"]
        .as_str()
        .ok_or(ReportError::InvalidTask)?;
    let custom: Value = serde_json::from_str(raw).map_err(|_| ReportError::InvalidTask)?;
    let fields = custom.as_object().ok_or(ReportError::InvalidTask)?;
    Ok(fields
        .get("uniqid")
        .and_then(Value::as_str)
        .map(str::to_string))
}

impl ReportResolver {
    pub fn new(backend: Arc<dyn SandboxBackend>) -> Self {
        Self { backend }
    }

    #[tracing::instrument(skip(self, correlation_id), fields(extension = %extension))]
    pub async fn resolve(
        &self,
        correlation_id: &str,
        extension: &str,
    ) -> Result<ReportOutcome, ReportError> {
        let format = ReportFormat::from_extension(extension).ok_or(ReportError::InvalidFormat)?;
        let task_id = parse_task_id(correlation_id)?;

        let report = match self.backend.fetch_report(task_id).await {
            Ok(ReportFetch::Ready(report)) => report,
            Ok(ReportFetch::NotReady { status }) => {
                tracing::debug!(task_id, status, "Report pending");
                return Ok(ReportOutcome::Pending);
            }
            Err(FetchError::Transport(error)) => {
                tracing::error!(task_id, error = %error, "Sandbox unreachable");
                return Err(ReportError::BackendUnavailable);
            }
            Err(FetchError::Decode(error)) => {
                tracing::warn!(task_id, error = %error, "Report body is not JSON");
                return Err(ReportError::InvalidTask);
            }
        };

        let uniqid = embedded_uniqid(&report)?.unwrap_or_default();
        let authorized = SubmissionToken::parse(token_part(correlation_id))
            .is_some_and(|token| token.matches(&uniqid));
        if !authorized {
            tracing::warn!(task_id, "Report token mismatch");
            return Err(ReportError::AuthenticationFailed);
        }

        let rendered = renderer_for(format).render(&report).map_err(|error| {
            tracing::error!(task_id, error = %error, "Report rendering failed");
            ReportError::InvalidTask
        })?;

        tracing::info!(task_id, format = %format, "Report served");
        Ok(ReportOutcome::Ready(rendered))
    }
}
