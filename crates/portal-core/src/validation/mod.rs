//! Validation modules

pub mod form;

pub use form::{
    file_basename, validate_submission, RawSubmissionForm, ValidatedSubmission,
    MAX_TIMEOUT_MINUTES, MIN_TIMEOUT_MINUTES,
};
