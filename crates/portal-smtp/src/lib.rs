//! SMTP front end.
//!
//! Every message received is decomposed into its leaf MIME parts, which are
//! submitted to the sandbox as one batch sharing a single token. Report links
//! can optionally be mailed back to the sender.

pub mod mail;
pub mod processor;
pub mod server;
pub mod session;

pub use mail::{decompose, Attachment, MailError, ParsedMessage};
pub use processor::MailProcessor;
pub use server::SmtpServer;
pub use session::{Action, Envelope, Reply, SmtpSession};
