//! TCP listener and per-connection SMTP loop.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use crate::processor::MailProcessor;
use crate::session::{Action, Reply, SmtpSession};

/// Connections idle longer than this are dropped with a 421.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Longest accepted line, CRLF included.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct SmtpServer {
    processor: MailProcessor,
    hostname: String,
    max_message_bytes: usize,
    idle_timeout: Duration,
}

async fn send<W: AsyncWrite + Unpin>(stream: &mut W, reply: &Reply) -> std::io::Result<()> {
    stream.write_all(reply.to_string().as_bytes()).await?;
    stream.flush().await
}

impl SmtpServer {
    pub fn new(processor: MailProcessor, hostname: impl Into<String>, max_message_bytes: usize) -> Self {
        Self {
            processor,
            hostname: hostname.into(),
            max_message_bytes,
            idle_timeout: IDLE_TIMEOUT,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Accept connections until `shutdown` resolves. Each connection runs on
    /// its own task; connections in flight are not awaited.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        let server = Arc::new(self);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to accept connection");
                            continue;
                        }
                    };
                    let server = server.clone();
                    tokio::spawn(async move {
                        server.handle(stream, peer).await;
                    });
                }
                _ = &mut shutdown => {
                    tracing::info!("SMTP listener stopped");
                    return Ok(());
                }
            }
        }
    }

    async fn handle<S>(&self, stream: S, peer: SocketAddr)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        tracing::debug!(peer = %peer, "SMTP connection opened");
        match self.serve_connection(stream).await {
            Ok(()) => tracing::debug!(peer = %peer, "SMTP connection closed"),
            Err(e) => tracing::warn!(peer = %peer, error = %e, "SMTP connection failed"),
        }
    }

    /// Run one SMTP conversation to completion.
    pub async fn serve_connection<S>(&self, stream: S) -> std::io::Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut stream = BufReader::new(stream);
        let mut session = SmtpSession::new(self.hostname.clone(), self.max_message_bytes);
        send(&mut stream, &session.greeting()).await?;

        let mut line = Vec::with_capacity(512);
        loop {
            line.clear();
            let read = {
                let mut limited = (&mut stream).take(MAX_LINE_BYTES as u64);
                tokio::time::timeout(self.idle_timeout, limited.read_until(b'\n', &mut line)).await
            };

            let n = match read {
                Ok(result) => result?,
                Err(_) => {
                    let reply = Reply::new(421, format!("{} idle timeout, closing", self.hostname));
                    return send(&mut stream, &reply).await;
                }
            };
            if n == 0 {
                return Ok(());
            }
            if n == MAX_LINE_BYTES && !line.ends_with(b"\n") {
                return send(&mut stream, &Reply::new(500, "Line too long")).await;
            }

            match session.feed(&line) {
                Action::Continue => {}
                Action::Reply(reply) => send(&mut stream, &reply).await?,
                Action::Close(reply) => return send(&mut stream, &reply).await,
                Action::Deliver(envelope) => {
                    let (reply, _) = self.processor.process(&envelope).await;
                    send(&mut stream, &reply).await?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::tests::TWO_ATTACHMENTS;
    use crate::processor::tests::processor;
    use tokio::io::{duplex, DuplexStream, ReadHalf, WriteHalf};

    struct Client {
        reader: BufReader<ReadHalf<DuplexStream>>,
        writer: WriteHalf<DuplexStream>,
    }

    impl Client {
        async fn reply(&mut self) -> String {
            let mut text = String::new();
            loop {
                let mut line = String::new();
                self.reader.read_line(&mut line).await.unwrap();
                text.push_str(&line);
                // Last line of a reply has a space after the code.
                if line.len() < 4 || line.as_bytes()[3] == b' ' {
                    return text;
                }
            }
        }

        async fn command(&mut self, line: &str) -> String {
            self.writer.write_all(line.as_bytes()).await.unwrap();
            self.writer.write_all(b"\r\n").await.unwrap();
            self.reply().await
        }
    }

    fn connect(server: SmtpServer) -> Client {
        let (client, server_side) = duplex(64 * 1024);
        tokio::spawn(async move {
            server.serve_connection(server_side).await.unwrap();
        });
        let (read, write) = tokio::io::split(client);
        Client {
            reader: BufReader::new(read),
            writer: write,
        }
    }

    #[tokio::test]
    async fn test_full_transaction_over_duplex() {
        let (processor, backend) = processor();
        let mut client = connect(SmtpServer::new(processor, "portal.test", 1024 * 1024));

        assert!(client.reply().await.starts_with("220 portal.test"));
        let ehlo = client.command("EHLO client.example").await;
        assert!(ehlo.starts_with("250-portal.test"));
        assert!(ehlo.contains("250-SIZE 1048576"));
        assert!(client.command("MAIL FROM:<sender@example.com>").await.starts_with("250"));
        assert!(client.command("RCPT TO:<portal@analysis>").await.starts_with("250"));
        assert!(client.command("DATA").await.starts_with("354"));

        let body = TWO_ATTACHMENTS.replace("\r\n.", "\r\n..");
        client.writer.write_all(body.as_bytes()).await.unwrap();
        let done = client.command(".").await;
        assert!(done.starts_with("250 Ok: 2 of 2 parts submitted"), "{}", done);

        assert!(client.command("QUIT").await.starts_with("221"));
        assert_eq!(backend.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_sequence_errors_over_duplex() {
        let (processor, backend) = processor();
        let mut client = connect(SmtpServer::new(processor, "portal.test", 1024));

        client.reply().await;
        assert!(client.command("DATA").await.starts_with("503"));
        assert!(client.command("EXPN staff").await.starts_with("500"));
        assert!(client.command("QUIT").await.starts_with("221"));
        assert!(backend.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_idle_timeout() {
        let (processor, _) = processor();
        let server = SmtpServer::new(processor, "portal.test", 1024)
            .with_idle_timeout(Duration::from_millis(50));
        let mut client = connect(server);

        client.reply().await;
        assert!(client.reply().await.starts_with("421"));
    }
}
