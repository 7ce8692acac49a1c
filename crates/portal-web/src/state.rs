//! Application state shared by all handlers.

use portal_api_client::SandboxBackend;
use portal_core::Config;
use portal_services::{ReportResolver, SubmissionDispatcher};
use std::sync::Arc;

/// Immutable per-process state. Cloned into handlers via `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub dispatcher: SubmissionDispatcher,
    pub resolver: ReportResolver,
}

impl AppState {
    pub fn new(config: Config, backend: Arc<dyn SandboxBackend>) -> Self {
        Self {
            config,
            dispatcher: SubmissionDispatcher::new(backend.clone()),
            resolver: ReportResolver::new(backend),
        }
    }
}
