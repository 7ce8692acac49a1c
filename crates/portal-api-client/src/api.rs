//! Endpoint paths and response shapes of the sandbox API.

use portal_core::SubmissionError;
use serde::Deserialize;

pub const CREATE_FILE_PATH: &str = "/tasks/create/file";
pub const CREATE_URL_PATH: &str = "/tasks/create/url";

pub fn report_path(task_id: u64) -> String {
    format!("/tasks/report/{}", task_id)
}

/// Body returned by both task-creation endpoints.
#[derive(Debug, Deserialize)]
pub struct CreateTaskResponse {
    #[serde(default)]
    pub task_id: Option<serde_json::Value>,
}

impl CreateTaskResponse {
    /// Parse a creation response and return its non-negative integer task id.
    pub fn task_id_from_slice(body: &[u8]) -> Result<u64, SubmissionError> {
        let parsed: CreateTaskResponse = serde_json::from_slice(body)
            .map_err(|e| SubmissionError::Decode(format!("invalid JSON: {}", e)))?;

        match parsed.task_id {
            Some(value) => value.as_u64().ok_or_else(|| {
                SubmissionError::Decode(format!("task_id is not an unsigned integer: {}", value))
            }),
            None => Err(SubmissionError::Decode("response lacks task_id".to_string())),
        }
    }
}

/// Result of a report fetch that reached the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportFetch {
    /// The report exists and parsed as JSON.
    Ready(serde_json::Value),
    /// The server answered with a non-success status; the task is still running.
    NotReady { status: u16 },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("report is not valid JSON: {0}")]
    Decode(String),
}
