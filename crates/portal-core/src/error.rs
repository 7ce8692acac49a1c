//! Error types module
//!
//! The portal distinguishes four families of failure:
//! - `ValidationErrors`: bad form input, reported as a list before any network call
//! - `SubmissionError`: task creation failed for one target; never fatal to its batch
//! - `ReportError`: report retrieval failed, each kind rendered as its own page
//! - `PortalError`: the error a request handler returns; it wraps report
//!   failures plus malformed requests and internal faults

/// Shown when every target of a batch failed to submit.
pub const BACKEND_DOWN_MESSAGE: &str = "It would appear our backend is down, please contact us \
     to report this issue at your earliest convenience.";

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like an unreachable backend
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "AUTHENTICATION_FAILED")
    fn error_code(&self) -> &'static str;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Failure to create a remote task for one target.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Remote API error: {0}")]
    Remote(String),
}

impl SubmissionError {
    pub fn kind(&self) -> &'static str {
        match self {
            SubmissionError::Network(_) => "network",
            SubmissionError::Decode(_) => "decode",
            SubmissionError::Remote(_) => "remote",
        }
    }
}

/// Failure to resolve a report from a correlation id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    #[error("Invalid report extension")]
    InvalidFormat,

    #[error("Invalid task identifier")]
    InvalidTaskId,

    #[error("Sandbox backend unavailable")]
    BackendUnavailable,

    #[error("Invalid task")]
    InvalidTask,

    #[error("Task authentication failed")]
    AuthenticationFailed,
}

impl ReportError {
    /// Message shown on the informational page.
    pub fn user_message(&self) -> &'static str {
        match self {
            ReportError::InvalidFormat => "Invalid report extension",
            ReportError::InvalidTaskId => "Invalid task identifier",
            ReportError::BackendUnavailable => {
                "It would appear our backend is down, please contact us at your earliest convenience."
            }
            ReportError::InvalidTask => "Invalid task",
            ReportError::AuthenticationFailed => "Task authentication failed",
        }
    }
}

/// Accumulated, human-readable form validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{} validation error(s): {}", .0.len(), .0.join("; "))]
pub struct ValidationErrors(pub Vec<String>);

impl ValidationErrors {
    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for PortalError {
    fn from(err: anyhow::Error) -> Self {
        PortalError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

/// Static metadata for each variant: (http_status, error_code, log_level).
fn portal_error_static_metadata(err: &PortalError) -> (u16, &'static str, LogLevel) {
    match err {
        PortalError::Report(report) => match report {
            ReportError::InvalidFormat => (404, "INVALID_FORMAT", LogLevel::Debug),
            ReportError::InvalidTaskId => (404, "INVALID_TASK_ID", LogLevel::Debug),
            ReportError::BackendUnavailable => (503, "BACKEND_UNAVAILABLE", LogLevel::Warn),
            ReportError::InvalidTask => (404, "INVALID_TASK", LogLevel::Warn),
            ReportError::AuthenticationFailed => (403, "AUTHENTICATION_FAILED", LogLevel::Warn),
        },
        PortalError::BadRequest(_) => (400, "BAD_REQUEST", LogLevel::Debug),
        PortalError::PayloadTooLarge(_) => (413, "PAYLOAD_TOO_LARGE", LogLevel::Debug),
        PortalError::InternalWithSource { .. } => (500, "INTERNAL_ERROR", LogLevel::Error),
    }
}

impl PortalError {
    /// Get the error type name for logging
    pub fn error_type(&self) -> &str {
        match self {
            PortalError::Report(_) => "Report",
            PortalError::BadRequest(_) => "BadRequest",
            PortalError::PayloadTooLarge(_) => "PayloadTooLarge",
            PortalError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for PortalError {
    fn http_status_code(&self) -> u16 {
        portal_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        portal_error_static_metadata(self).1
    }

    fn log_level(&self) -> LogLevel {
        portal_error_static_metadata(self).2
    }

    fn client_message(&self) -> String {
        match self {
            PortalError::Report(report) => report.user_message().to_string(),
            PortalError::BadRequest(ref msg) => msg.clone(),
            PortalError::PayloadTooLarge(ref msg) => msg.clone(),
            PortalError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}
