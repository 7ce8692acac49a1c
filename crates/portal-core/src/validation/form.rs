//! Web submission form validation.
//!
//! The raw form is validated as a whole before anything is submitted: every
//! problem is collected into one [`ValidationErrors`] list and no target is
//! handed to the dispatcher unless the list is empty.

use bytes::Bytes;

use crate::encoding::encode_options;
use crate::error::ValidationErrors;
use crate::models::{CustomMetadata, ReportFormat, SharedData, Target, TaskOptions};

pub const MIN_TIMEOUT_MINUTES: u32 = 1;
pub const MAX_TIMEOUT_MINUTES: u32 = 30;

/// Form fields exactly as received.
#[derive(Debug, Clone, Default)]
pub struct RawSubmissionForm {
    /// Uploaded files as (filename, content); empty filenames are skipped.
    pub files: Vec<(String, Bytes)>,
    /// Newline-delimited URLs.
    pub urls: String,
    pub timeout: String,
    pub priority: String,
    pub machine: String,
    pub route: String,
    pub email: String,
    pub reports: Vec<String>,
}

/// A form that passed validation, ready for batch submission.
#[derive(Debug, Clone)]
pub struct ValidatedSubmission {
    pub targets: Vec<Target>,
    pub shared: SharedData,
    pub custom: CustomMetadata,
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Last path component of a client supplied filename.
pub fn file_basename(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Validate the raw form and build the batch to submit.
pub fn validate_submission(form: RawSubmissionForm) -> Result<ValidatedSubmission, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let timeout = form.timeout.trim();
    let mut timeout_minutes = None;
    if !is_digits(timeout) {
        errors.push("Timeout is not a number, please specify the timeout in minutes.");
    } else {
        match timeout.parse::<u32>() {
            Ok(minutes) if (MIN_TIMEOUT_MINUTES..=MAX_TIMEOUT_MINUTES).contains(&minutes) => {
                timeout_minutes = Some(minutes)
            }
            _ => errors.push("Timeout must be between one and 30 minutes."),
        }
    }

    // Digit strings beyond u64 are rejected.
    let priority = form.priority.trim();
    let parsed_priority = if is_digits(priority) {
        priority.parse::<u64>().ok()
    } else {
        None
    };
    if parsed_priority.is_none() {
        errors.push("Invalid priority given.");
    }

    let email = form.email.trim();
    if email.is_empty() {
        errors.push("Please specify an email address so to retrieve the analysis reports.");
    }

    let mut reports: Vec<ReportFormat> = Vec::new();
    for format in form.reports.iter().filter_map(|r| ReportFormat::from_form_value(r.trim())) {
        if !reports.contains(&format) {
            reports.push(format);
        }
    }
    if reports.is_empty() {
        errors.push("You must select at least one reporting format.");
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let route = form.route.trim();
    let options = TaskOptions::new()
        .with("procmemdump", "1")
        .with("route", route)
        .with("json.calls", "0");

    let machine = form.machine.trim();
    let shared = SharedData {
        timeout_secs: timeout_minutes.map(|m| m * 60),
        priority: parsed_priority,
        machine: (!machine.is_empty()).then(|| machine.to_string()),
        options: encode_options(&options),
    };

    let mut targets: Vec<Target> = form
        .files
        .into_iter()
        .filter(|(filename, _)| !filename.is_empty())
        .map(|(filename, content)| Target::file(file_basename(&filename), content))
        .collect();
    targets.extend(
        form.urls
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(Target::url),
    );

    Ok(ValidatedSubmission {
        targets,
        shared,
        custom: CustomMetadata::new(email, reports),
    })
}
