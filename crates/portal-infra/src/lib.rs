//! Portal Infrastructure Library
//!
//! This crate provides shared infrastructure components used by the portal
//! front ends:
//! - Middleware (request ID, security headers)
//! - Telemetry initialization (tracing subscriber)
//! - Graceful shutdown on Ctrl+C / SIGTERM

#[cfg(feature = "middleware")]
pub mod middleware;

pub mod shutdown;

#[cfg(feature = "observability-basic")]
pub mod telemetry;

// Re-export commonly used types
#[cfg(feature = "middleware")]
pub use middleware::{
    get_request_id, request_id_middleware, security_headers_middleware, RequestId,
};

pub use shutdown::shutdown_signal;

#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, LogFormat};
