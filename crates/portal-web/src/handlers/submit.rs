//! Form submission handler
//!
//! The whole form is validated before anything is sent to the sandbox. A
//! valid form is submitted as one batch under a single token; failed targets
//! are reported next to the accepted ones.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    response::Html,
};
use portal_core::{validate_submission, RawSubmissionForm, BACKEND_DOWN_MESSAGE};
use portal_services::TargetFailure;

use crate::error::HttpPortalError;
use crate::pages;
use crate::state::AppState;

pub const NO_TARGETS_MESSAGE: &str = "At least one file or URL should be specified";

async fn read_form(multipart: &mut Multipart) -> Result<RawSubmissionForm, HttpPortalError> {
    let mut form = RawSubmissionForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content = field.bytes().await?;
                form.files.push((filename, content));
            }
            "url" => form.urls = field.text().await?,
            "timeout" => form.timeout = field.text().await?,
            "priority" => form.priority = field.text().await?,
            "machine" => form.machine = field.text().await?,
            "route" => form.route = field.text().await?,
            "email" => form.email = field.text().await?,
            "report" => form.reports.push(field.text().await?),
            _ => tracing::debug!(field = %name, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

#[tracing::instrument(skip(state, multipart))]
pub async fn submit(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Html<String>, HttpPortalError> {
    let form = read_form(&mut multipart).await?;
    // Echoed back on the form page; files are not.
    let values = RawSubmissionForm {
        files: Vec::new(),
        ..form.clone()
    };

    let validated = match validate_submission(form) {
        Ok(validated) => validated,
        Err(errors) => {
            tracing::debug!(errors = errors.messages().len(), "Form rejected");
            return Ok(Html(pages::form_page(
                &state.config,
                &values,
                errors.messages(),
            )));
        }
    };

    if validated.targets.is_empty() {
        return Ok(Html(pages::form_page(
            &state.config,
            &values,
            &[NO_TARGETS_MESSAGE.to_string()],
        )));
    }

    let outcome = state
        .dispatcher
        .submit_batch(&validated.targets, &validated.shared, &validated.custom)
        .await;

    if outcome.all_failed() {
        let mut errors: Vec<String> = outcome.failures.iter().map(TargetFailure::message).collect();
        errors.push(BACKEND_DOWN_MESSAGE.to_string());
        return Ok(Html(pages::form_page(&state.config, &values, &errors)));
    }

    Ok(Html(pages::submitted_page(
        &outcome,
        &validated.custom.reports,
    )))
}
