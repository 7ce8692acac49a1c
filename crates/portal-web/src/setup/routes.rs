//! Route configuration and setup

use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::{DefaultBodyLimit, Request},
    routing::get,
    Router,
};
use portal_core::Config;
use portal_infra::{get_request_id, request_id_middleware, security_headers_middleware};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Span for one HTTP request. Report paths carry capabilities, so only the
/// route prefix is recorded.
fn request_span(request: &Request) -> tracing::Span {
    let path = request.uri().path();
    let route = if path.starts_with("/report/") { "/report" } else { path };
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        route = %route,
        request_id = %get_request_id(request).unwrap_or_default(),
    )
}

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Router<()> {
    tracing::info!(
        max_upload_mb = config.max_upload_bytes / 1024 / 1024,
        "Upload body limit configured"
    );

    Router::new()
        .route(
            "/",
            get(handlers::index::index).post(handlers::submit::submit),
        )
        .route("/report/{file}", get(handlers::report::report))
        .route("/health", get(handlers::health::liveness_check))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn(security_headers_middleware))
}
