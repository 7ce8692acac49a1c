//! Helpers for the `mailsample` tool.

use std::path::Path;

use anyhow::Context;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart};
use lettre::Message;

/// Mailbox the SMTP front end accepts samples for.
pub const PORTAL_MAILBOX: &str = "portal@analysis";

pub const DEFAULT_SMTP_PORT: u16 = 25;

/// Split `host[:port]`, defaulting to port 25.
pub fn parse_relay(addr: &str) -> (String, u16) {
    match addr.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => match port.parse() {
            Ok(port) => (host.to_string(), port),
            Err(_) => (addr.to_string(), DEFAULT_SMTP_PORT),
        },
        _ => (addr.to_string(), DEFAULT_SMTP_PORT),
    }
}

/// Attachment name for a sample path.
pub fn sample_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sample".to_string())
}

/// Build the submission mail carrying `content` as a single attachment.
pub fn build_message(email: &str, filename: &str, content: Vec<u8>) -> anyhow::Result<Message> {
    let attachment = Attachment::new(filename.to_string())
        .body(content, ContentType::parse("application/octet-stream")?);

    Message::builder()
        .from(email.parse().with_context(|| format!("Invalid email address: {}", email))?)
        .to(PORTAL_MAILBOX.parse()?)
        .subject("Sample submission")
        .multipart(MultiPart::mixed().singlepart(attachment))
        .context("Failed to build message")
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_relay_with_port() {
        assert_eq!(parse_relay("127.0.0.1:2525"), ("127.0.0.1".to_string(), 2525));
    }

    #[test]
    fn parse_relay_default_port() {
        assert_eq!(parse_relay("mail.example"), ("mail.example".to_string(), 25));
        assert_eq!(parse_relay("mail.example:smtp"), ("mail.example:smtp".to_string(), 25));
    }

    #[test]
    fn sample_name_is_basename() {
        assert_eq!(sample_name(Path::new("/tmp/samples/dropper.exe")), "dropper.exe");
        assert_eq!(sample_name(Path::new("invoice.pdf")), "invoice.pdf");
    }

    #[test]
    fn build_message_headers_and_attachment() {
        let message = build_message("analyst@example.com", "dropper.exe", b"MZ".to_vec()).unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).into_owned();

        assert!(raw.contains("Subject: Sample submission"));
        assert!(raw.contains("To: portal@analysis"));
        assert!(raw.contains("From: analyst@example.com"));
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("application/octet-stream"));
        assert!(raw.contains("filename=\"dropper.exe\""));
    }

    #[test]
    fn build_message_rejects_bad_sender() {
        assert!(build_message("not an address", "a.exe", vec![]).is_err());
    }
}
