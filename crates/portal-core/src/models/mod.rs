//! Data models for the portal
//!
//! Submission identity (tokens and correlation ids), submission targets and
//! their shared options, and report formats.

mod report;
mod submission;
mod token;

pub use report::*;
pub use submission::*;
pub use token::*;
