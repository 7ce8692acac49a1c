//! Portal Services Layer
//!
//! Orchestration between the ingestion front ends and the sandbox API:
//! batch submission with per-target failure isolation, report resolution
//! with token authorization, report rendering and the optional mail-back of
//! report links. HTTP and SMTP handling stay in their own crates.

pub mod dispatcher;
#[cfg(feature = "notify")]
pub mod notify;
pub mod render;
pub mod resolver;

pub use dispatcher::{AcceptedTarget, BatchOutcome, SubmissionDispatcher, TargetFailure};
#[cfg(feature = "notify")]
pub use notify::ReportNotifier;
pub use render::{escape_html, renderer_for, ReportRenderer, ReportSummary};
pub use resolver::{ReportOutcome, ReportResolver};

pub use portal_api_client::{SandboxBackend, SandboxClient};
