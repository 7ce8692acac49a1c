//! Portal Core Library
//!
//! This crate provides the domain types, submission identity, option/metadata
//! encoders, form validation, error types and configuration shared by the
//! web and SMTP front ends.

pub mod config;
pub mod encoding;
pub mod error;
pub mod identity;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{Config, NotifyConfig};
pub use encoding::{decode_custom, encode_custom, encode_options};
pub use error::{
    ErrorMetadata, LogLevel, PortalError, ReportError, SubmissionError, ValidationErrors,
    BACKEND_DOWN_MESSAGE,
};
pub use identity::new_token;
pub use models::{
    CorrelationId, CustomMetadata, ReportFormat, RenderedReport, SharedData, SubmissionToken,
    Target, TaskOptions, TOKEN_LEN,
};
pub use validation::{validate_submission, RawSubmissionForm, ValidatedSubmission};
