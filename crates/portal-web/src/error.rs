//! HTTP error response conversion
//!
//! Handlers return `Result<_, HttpPortalError>`. Every error renders as an
//! HTML page carrying the client message for its kind; internal details are
//! only logged.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use portal_core::{ErrorMetadata, LogLevel, PortalError, ReportError};

use crate::pages;

/// Wrapper type for PortalError to implement IntoResponse
#[derive(Debug)]
pub struct HttpPortalError(pub PortalError);

impl From<PortalError> for HttpPortalError {
    fn from(err: PortalError) -> Self {
        HttpPortalError(err)
    }
}

impl From<ReportError> for HttpPortalError {
    fn from(err: ReportError) -> Self {
        HttpPortalError(PortalError::Report(err))
    }
}

impl From<anyhow::Error> for HttpPortalError {
    fn from(err: anyhow::Error) -> Self {
        HttpPortalError(PortalError::from(err))
    }
}

impl From<MultipartError> for HttpPortalError {
    fn from(rejection: MultipartError) -> Self {
        let message = rejection.body_text();
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            HttpPortalError(PortalError::PayloadTooLarge(message))
        } else {
            HttpPortalError(PortalError::BadRequest(format!(
                "Invalid form data: {}",
                message
            )))
        }
    }
}

fn log_error(error: &PortalError) {
    let error_type = error.error_type();
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type, code, "Request failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type, code, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(
                error = %error.detailed_message(),
                error_type,
                code,
                "Request failed"
            );
        }
    }
}

impl IntoResponse for HttpPortalError {
    fn into_response(self) -> Response {
        let error = &self.0;
        let status = StatusCode::from_u16(error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(error);

        (status, Html(pages::error_page(&error.client_message()))).into_response()
    }
}
