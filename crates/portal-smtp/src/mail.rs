//! MIME decomposition of received messages.

use bytes::Bytes;
use mailparse::{addrparse, parse_mail, MailAddr, MailHeaderMap, ParsedMail};
use portal_core::validation::file_basename;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Malformed message: {0}")]
    Parse(#[from] mailparse::MailParseError),
}

/// One leaf part of a message, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content: Bytes,
}

/// What the processor needs from a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedMessage {
    pub from: Option<String>,
    pub attachments: Vec<Attachment>,
}

fn part_filename(part: &ParsedMail<'_>) -> Option<String> {
    let disposition = part.get_content_disposition();
    disposition
        .params
        .get("filename")
        .or_else(|| part.ctype.params.get("name"))
        .map(|name| file_basename(name.trim()).to_string())
        .filter(|name| !name.is_empty())
}

fn collect_leaves(part: &ParsedMail<'_>, out: &mut Vec<Attachment>) -> Result<(), MailError> {
    if part.ctype.mimetype.starts_with("multipart/") {
        for sub in &part.subparts {
            collect_leaves(sub, out)?;
        }
        return Ok(());
    }

    // Forwarded messages are walked like the outer one.
    if part.ctype.mimetype.eq_ignore_ascii_case("message/rfc822") {
        let embedded = part.get_body_raw()?;
        return collect_leaves(&parse_mail(&embedded)?, out);
    }

    let content = part.get_body_raw()?;
    let filename =
        part_filename(part).unwrap_or_else(|| format!("attachment-{}", out.len() + 1));
    out.push(Attachment {
        filename,
        content: Bytes::from(content),
    });
    Ok(())
}

/// First address of the `From` header, if any parses.
fn from_address(mail: &ParsedMail<'_>) -> Option<String> {
    let raw = mail.headers.get_first_value("From")?;
    let list = addrparse(&raw).ok()?;
    list.iter().find_map(|addr| match addr {
        MailAddr::Single(info) => Some(info.addr.clone()),
        MailAddr::Group(group) => group.addrs.first().map(|info| info.addr.clone()),
    })
}

/// Split a raw message into its leaf parts. Every non-multipart part counts,
/// including a plain text body; attached messages contribute their own leaves.
pub fn decompose(raw: &[u8]) -> Result<ParsedMessage, MailError> {
    let mail = parse_mail(raw)?;
    let mut attachments = Vec::new();
    collect_leaves(&mail, &mut attachments)?;
    Ok(ParsedMessage {
        from: from_address(&mail),
        attachments,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const TWO_ATTACHMENTS: &str = "From: Analyst <analyst@example.com>\r\n\
To: portal@analysis\r\n\
Subject: Sample submission\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"XYZ\"\r\n\
\r\n\
--XYZ\r\n\
Content-Type: application/octet-stream\r\n\
Content-Disposition: attachment; filename=\"../samples/dropper.exe\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
TVqQAAMAAAA=\r\n\
--XYZ\r\n\
Content-Type: application/pdf; name=\"invoice.pdf\"\r\n\
\r\n\
%PDF-1.4 body\r\n\
--XYZ--\r\n";

    #[test]
    fn test_two_attachments() {
        let parsed = decompose(TWO_ATTACHMENTS.as_bytes()).unwrap();
        assert_eq!(parsed.from.as_deref(), Some("analyst@example.com"));
        assert_eq!(parsed.attachments.len(), 2);

        assert_eq!(parsed.attachments[0].filename, "dropper.exe");
        assert_eq!(
            parsed.attachments[0].content.as_ref(),
            b"MZ\x90\x00\x03\x00\x00\x00"
        );
        assert_eq!(parsed.attachments[1].filename, "invoice.pdf");
        assert!(parsed.attachments[1].content.starts_with(b"%PDF-1.4 body"));
    }

    #[test]
    fn test_single_part_body_is_an_attachment() {
        let raw = b"From: someone@example.com\r\nSubject: hi\r\n\r\nhello\r\n";
        let parsed = decompose(raw).unwrap();
        assert_eq!(parsed.attachments.len(), 1);
        assert_eq!(parsed.attachments[0].filename, "attachment-1");
        assert!(parsed.attachments[0].content.starts_with(b"hello"));
    }

    #[test]
    fn test_forwarded_message_is_descended() {
        let raw = "From: relay@example.com\r\n\
Content-Type: multipart/mixed; boundary=\"OUTER\"\r\n\
\r\n\
--OUTER\r\n\
Content-Type: text/plain\r\n\
\r\n\
see attached\r\n\
--OUTER\r\n\
Content-Type: message/rfc822\r\n\
\r\n\
From: victim@example.com\r\n\
Content-Type: multipart/mixed; boundary=\"INNER\"\r\n\
\r\n\
--INNER\r\n\
Content-Type: application/octet-stream\r\n\
Content-Disposition: attachment; filename=\"payload.exe\"\r\n\
\r\n\
MZ\r\n\
--INNER--\r\n\
--OUTER--\r\n";
        let parsed = decompose(raw.as_bytes()).unwrap();
        assert_eq!(parsed.from.as_deref(), Some("relay@example.com"));
        let names: Vec<&str> = parsed.attachments.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, ["attachment-1", "payload.exe"]);
        assert!(parsed.attachments[1].content.starts_with(b"MZ"));
    }

    #[test]
    fn test_missing_from_header() {
        let parsed = decompose(b"Subject: hi\r\n\r\nbody\r\n").unwrap();
        assert_eq!(parsed.from, None);
    }
}
