//! Tracing initialization shared by the portal binaries.

mod init;

pub use init::{init_telemetry, LogFormat};
