//! Portal Web Library
//!
//! This crate provides the HTTP front end: the submission form, the batch
//! submission handler and the report endpoint.

pub mod error;
mod handlers;
pub mod pages;
pub mod setup;
pub mod state;

pub use error::HttpPortalError;
pub use state::AppState;
