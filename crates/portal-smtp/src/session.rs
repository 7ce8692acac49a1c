//! SMTP session state machine.
//!
//! The session is I/O free: the connection loop feeds it one line at a time
//! and acts on the returned [`Action`]. Only the commands needed to receive
//! mail are implemented.

use std::fmt;

/// One SMTP reply, possibly multi-line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    pub lines: Vec<String>,
}

impl Reply {
    pub fn new(code: u16, text: impl Into<String>) -> Self {
        Self {
            code,
            lines: vec![text.into()],
        }
    }

    pub fn multi(code: u16, lines: Vec<String>) -> Self {
        Self { code, lines }
    }

    pub fn ok() -> Self {
        Self::new(250, "Ok")
    }

    pub fn bad_sequence() -> Self {
        Self::new(503, "Bad sequence of commands")
    }

    pub fn unrecognized() -> Self {
        Self::new(500, "Command not recognized")
    }

    pub fn syntax_error(text: &str) -> Self {
        Self::new(501, text)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last = self.lines.len().saturating_sub(1);
        if self.lines.is_empty() {
            return write!(f, "{}\r\n", self.code);
        }
        for (i, line) in self.lines.iter().enumerate() {
            let sep = if i == last { ' ' } else { '-' };
            write!(f, "{}{}{}\r\n", self.code, sep, line)?;
        }
        Ok(())
    }
}

/// A complete message received in one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Reverse path; empty for the null sender.
    pub sender: String,
    pub recipients: Vec<String>,
    /// Message content, dot-unstuffed, CRLF line endings.
    pub message: Vec<u8>,
}

/// What the connection loop should do after feeding a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Reply(Reply),
    /// A data line was buffered; nothing to send.
    Continue,
    /// A message is complete. The caller processes it and replies.
    Deliver(Envelope),
    /// Send the reply and close the connection.
    Close(Reply),
}

#[derive(Debug, Default)]
struct Transaction {
    sender: Option<String>,
    recipients: Vec<String>,
}

#[derive(Debug)]
enum Phase {
    Command,
    Data { buffer: Vec<u8>, oversized: bool },
}

#[derive(Debug)]
pub struct SmtpSession {
    hostname: String,
    max_message_bytes: usize,
    peer_name: Option<String>,
    transaction: Transaction,
    phase: Phase,
}

/// Extract the path from `FROM:<path> params` / `TO:<path> params`.
fn parse_path<'a>(args: &'a str, keyword: &str) -> Option<&'a str> {
    let head = args.get(..keyword.len())?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    let rest = args[keyword.len()..].trim_start();
    let rest = rest.strip_prefix('<')?;
    let end = rest.find('>')?;
    Some(&rest[..end])
}

impl SmtpSession {
    pub fn new(hostname: impl Into<String>, max_message_bytes: usize) -> Self {
        Self {
            hostname: hostname.into(),
            max_message_bytes,
            peer_name: None,
            transaction: Transaction::default(),
            phase: Phase::Command,
        }
    }

    pub fn greeting(&self) -> Reply {
        Reply::new(220, format!("{} ESMTP sample portal ready", self.hostname))
    }

    pub fn in_data(&self) -> bool {
        matches!(self.phase, Phase::Data { .. })
    }

    pub fn max_message_bytes(&self) -> usize {
        self.max_message_bytes
    }

    fn reset(&mut self) {
        self.transaction = Transaction::default();
        self.phase = Phase::Command;
    }

    /// Feed one line, with or without its trailing CRLF.
    pub fn feed(&mut self, line: &[u8]) -> Action {
        let line = line
            .strip_suffix(b"\n")
            .map(|l| l.strip_suffix(b"\r").unwrap_or(l))
            .unwrap_or(line);

        if self.in_data() {
            return self.data_line(line);
        }

        match std::str::from_utf8(line) {
            Ok(text) => self.command(text),
            Err(_) => Action::Reply(Reply::unrecognized()),
        }
    }

    fn data_line(&mut self, line: &[u8]) -> Action {
        if line == b"." {
            let phase = std::mem::replace(&mut self.phase, Phase::Command);
            let Phase::Data { buffer, oversized } = phase else {
                return Action::Reply(Reply::bad_sequence());
            };
            let transaction = std::mem::take(&mut self.transaction);
            if oversized {
                return Action::Reply(Reply::new(
                    552,
                    "Message size exceeds fixed maximum message size",
                ));
            }
            return Action::Deliver(Envelope {
                sender: transaction.sender.unwrap_or_default(),
                recipients: transaction.recipients,
                message: buffer,
            });
        }

        let max = self.max_message_bytes;
        if let Phase::Data { buffer, oversized } = &mut self.phase {
            if !*oversized {
                let unstuffed = line.strip_prefix(b".").unwrap_or(line);
                if buffer.len() + unstuffed.len() + 2 > max {
                    *oversized = true;
                    buffer.clear();
                    buffer.shrink_to_fit();
                } else {
                    buffer.extend_from_slice(unstuffed);
                    buffer.extend_from_slice(b"\r\n");
                }
            }
        }
        Action::Continue
    }

    fn command(&mut self, line: &str) -> Action {
        let (verb, args) = match line.split_once(' ') {
            Some((verb, args)) => (verb, args.trim()),
            None => (line.trim(), ""),
        };

        match verb.to_ascii_uppercase().as_str() {
            "HELO" | "EHLO" if args.is_empty() => {
                Action::Reply(Reply::syntax_error("Syntax: HELO/EHLO domain"))
            }
            "HELO" => {
                self.reset();
                self.peer_name = Some(args.to_string());
                Action::Reply(Reply::new(250, self.hostname.clone()))
            }
            "EHLO" => {
                self.reset();
                self.peer_name = Some(args.to_string());
                Action::Reply(Reply::multi(
                    250,
                    vec![
                        self.hostname.clone(),
                        format!("SIZE {}", self.max_message_bytes),
                        "8BITMIME".to_string(),
                    ],
                ))
            }
            "MAIL" => {
                if self.peer_name.is_none() || self.transaction.sender.is_some() {
                    return Action::Reply(Reply::bad_sequence());
                }
                match parse_path(args, "FROM:") {
                    Some(path) => {
                        self.transaction.sender = Some(path.to_string());
                        Action::Reply(Reply::ok())
                    }
                    None => Action::Reply(Reply::syntax_error("Syntax: MAIL FROM:<address>")),
                }
            }
            "RCPT" => {
                if self.transaction.sender.is_none() {
                    return Action::Reply(Reply::bad_sequence());
                }
                match parse_path(args, "TO:") {
                    Some(path) if !path.is_empty() => {
                        self.transaction.recipients.push(path.to_string());
                        Action::Reply(Reply::ok())
                    }
                    _ => Action::Reply(Reply::syntax_error("Syntax: RCPT TO:<address>")),
                }
            }
            "DATA" => {
                if self.transaction.recipients.is_empty() {
                    return Action::Reply(Reply::bad_sequence());
                }
                self.phase = Phase::Data {
                    buffer: Vec::new(),
                    oversized: false,
                };
                Action::Reply(Reply::new(354, "End data with <CR><LF>.<CR><LF>"))
            }
            "RSET" => {
                self.reset();
                Action::Reply(Reply::ok())
            }
            "NOOP" => Action::Reply(Reply::ok()),
            "QUIT" => Action::Close(Reply::new(221, format!("{} closing connection", self.hostname))),
            _ => Action::Reply(Reply::unrecognized()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply_code(action: Action) -> u16 {
        match action {
            Action::Reply(reply) | Action::Close(reply) => reply.code,
            other => panic!("Expected a reply, got {:?}", other),
        }
    }

    fn session() -> SmtpSession {
        SmtpSession::new("portal.test", 1024)
    }

    #[test]
    fn test_full_transaction() {
        let mut s = session();
        assert_eq!(s.greeting().code, 220);
        assert_eq!(reply_code(s.feed(b"EHLO client.example\r\n")), 250);
        assert_eq!(reply_code(s.feed(b"MAIL FROM:<a@b.c> SIZE=100\r\n")), 250);
        assert_eq!(reply_code(s.feed(b"RCPT TO:<portal@analysis>\r\n")), 250);
        assert_eq!(reply_code(s.feed(b"DATA\r\n")), 354);
        assert_eq!(s.feed(b"Subject: hi\r\n"), Action::Continue);
        assert_eq!(s.feed(b"\r\n"), Action::Continue);
        assert_eq!(s.feed(b"..leading dot\r\n"), Action::Continue);
        match s.feed(b".\r\n") {
            Action::Deliver(envelope) => {
                assert_eq!(envelope.sender, "a@b.c");
                assert_eq!(envelope.recipients, vec!["portal@analysis"]);
                assert_eq!(envelope.message, b"Subject: hi\r\n\r\n.leading dot\r\n");
            }
            other => panic!("Expected Deliver, got {:?}", other),
        }
        assert!(!s.in_data());
        // Transaction was reset; the session is still greeted.
        assert_eq!(reply_code(s.feed(b"RCPT TO:<x@y>\r\n")), 503);
        assert_eq!(reply_code(s.feed(b"MAIL FROM:<>\r\n")), 250);
        assert_eq!(reply_code(s.feed(b"QUIT\r\n")), 221);
    }

    #[test]
    fn test_out_of_order_commands() {
        let mut s = session();
        assert_eq!(reply_code(s.feed(b"MAIL FROM:<a@b.c>")), 503);
        assert_eq!(reply_code(s.feed(b"HELO client")), 250);
        assert_eq!(reply_code(s.feed(b"DATA")), 503);
        assert_eq!(reply_code(s.feed(b"RCPT TO:<x@y>")), 503);
        assert_eq!(reply_code(s.feed(b"MAIL FROM:<a@b.c>")), 250);
        assert_eq!(reply_code(s.feed(b"MAIL FROM:<a@b.c>")), 503);
        assert_eq!(reply_code(s.feed(b"RSET")), 250);
        assert_eq!(reply_code(s.feed(b"MAIL FROM:<a@b.c>")), 250);
    }

    #[test]
    fn test_unknown_and_malformed_commands() {
        let mut s = session();
        assert_eq!(reply_code(s.feed(b"VRFY root")), 500);
        assert_eq!(reply_code(s.feed(b"")), 500);
        assert_eq!(reply_code(s.feed(b"\xff\xfe")), 500);
        assert_eq!(reply_code(s.feed(b"HELO")), 501);
        assert_eq!(reply_code(s.feed(b"helo client")), 250);
        assert_eq!(reply_code(s.feed(b"MAIL FROM:a@b.c")), 501);
        assert_eq!(reply_code(s.feed(b"NOOP")), 250);
    }

    #[test]
    fn test_oversized_message() {
        let mut s = SmtpSession::new("portal.test", 16);
        s.feed(b"HELO c");
        s.feed(b"MAIL FROM:<a@b.c>");
        s.feed(b"RCPT TO:<p@q>");
        s.feed(b"DATA");
        assert_eq!(s.feed(b"0123456789"), Action::Continue);
        assert_eq!(s.feed(b"0123456789"), Action::Continue);
        assert_eq!(reply_code(s.feed(b".")), 552);
        assert!(!s.in_data());
        assert_eq!(reply_code(s.feed(b"RCPT TO:<p@q>")), 503);
    }

    #[test]
    fn test_multiline_reply_format() {
        let reply = Reply::multi(250, vec!["host".into(), "SIZE 10".into(), "8BITMIME".into()]);
        assert_eq!(reply.to_string(), "250-host\r\n250-SIZE 10\r\n250 8BITMIME\r\n");
        assert_eq!(Reply::ok().to_string(), "250 Ok\r\n");
    }
}
