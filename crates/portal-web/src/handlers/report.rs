use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse, Response},
};
use portal_core::ReportError;
use portal_services::ReportOutcome;

use crate::error::HttpPortalError;
use crate::pages;
use crate::state::AppState;

/// `GET /report/{id}.{ext}`
#[tracing::instrument(skip(state, file))]
pub async fn report(
    State(state): State<Arc<AppState>>,
    Path(file): Path<String>,
) -> Result<Response, HttpPortalError> {
    let (correlation_id, extension) = file.rsplit_once('.').ok_or(ReportError::InvalidFormat)?;

    match state.resolver.resolve(correlation_id, extension).await? {
        ReportOutcome::Ready(rendered) => Ok((
            [(header::CONTENT_TYPE, rendered.content_type)],
            rendered.body,
        )
            .into_response()),
        ReportOutcome::Pending => Ok(Html(pages::pending_page()).into_response()),
    }
}
