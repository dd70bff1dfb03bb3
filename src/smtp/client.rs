//! Synchronous SMTP protocol engine.
//!
//! Handles the TCP connection, STARTTLS upgrade, EHLO negotiation,
//! authentication and the per-message MAIL FROM / RCPT TO / DATA exchange.
//! The whole run is single-threaded, so the engine blocks on every read
//! and write; no timeouts are enforced.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::Arc;

use base64::Engine;
use log::{debug, info};
use rustls::{ClientConnection, StreamOwned};

use super::{EhloCapabilities, SmtpError, SmtpReply, SmtpResult, Transport};

/// Wrapper over the plain-text or TLS socket so the rest of the engine is
/// generic over both.
enum Stream {
    Plain(BufReader<TcpStream>),
    Tls(BufReader<StreamOwned<ClientConnection, TcpStream>>),
}

impl Stream {
    fn read_line(&mut self, buf: &mut String) -> SmtpResult<usize> {
        match self {
            Self::Plain(r) => r.read_line(buf).map_err(|e| SmtpError::Io(e.to_string())),
            Self::Tls(r) => r.read_line(buf).map_err(|e| SmtpError::Io(e.to_string())),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> SmtpResult<()> {
        match self {
            Self::Plain(r) => r
                .get_mut()
                .write_all(data)
                .map_err(|e| SmtpError::Io(e.to_string())),
            Self::Tls(r) => r
                .get_mut()
                .write_all(data)
                .map_err(|e| SmtpError::Io(e.to_string())),
        }
    }

    fn flush(&mut self) -> SmtpResult<()> {
        match self {
            Self::Plain(r) => r.get_mut().flush().map_err(|e| SmtpError::Io(e.to_string())),
            Self::Tls(r) => r.get_mut().flush().map_err(|e| SmtpError::Io(e.to_string())),
        }
    }
}

/// A synchronous SMTP submission session.
///
/// Opened once per run and reused for every message. `Drop` issues a
/// best-effort QUIT so the connection is released even when the run
/// aborts early.
pub struct SmtpSession {
    stream: Option<Stream>,
    host: String,
    capabilities: EhloCapabilities,
    tls_active: bool,
    authenticated: bool,
    messages_sent: u64,
}

impl SmtpSession {
    /// Connect, negotiate STARTTLS and authenticate in one step.
    pub fn open(host: &str, port: u16, username: &str, password: &str) -> SmtpResult<Self> {
        let mut session = Self::connect(host, port)?;
        session.ehlo()?;
        session.starttls()?;
        session.login(username, password)?;
        Ok(session)
    }

    /// Connect to the server and read its greeting.
    pub fn connect(host: &str, port: u16) -> SmtpResult<Self> {
        let addr = format!("{}:{}", host, port);
        debug!("connecting to {}", addr);

        let tcp = TcpStream::connect(&addr)
            .map_err(|e| SmtpError::Connection(format!("{}: {}", addr, e)))?;

        let mut session = Self {
            stream: Some(Stream::Plain(BufReader::new(tcp))),
            host: host.to_string(),
            capabilities: EhloCapabilities::default(),
            tls_active: false,
            authenticated: false,
            messages_sent: 0,
        };

        let greeting = session.read_reply()?;
        if greeting.is_error() {
            return Err(SmtpError::Server {
                code: greeting.code,
                message: format!("server rejected connection: {}", greeting.text()),
            });
        }
        info!("connected to {} - {}", addr, greeting.text());
        Ok(session)
    }

    pub fn capabilities(&self) -> &EhloCapabilities {
        &self.capabilities
    }

    pub fn is_tls_active(&self) -> bool {
        self.tls_active
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn messages_sent(&self) -> u64 {
        self.messages_sent
    }

    /// Issue EHLO and parse the advertised capability set.
    pub fn ehlo(&mut self) -> SmtpResult<()> {
        let reply = self.command("EHLO localhost")?;
        if !reply.is_positive() {
            return Err(SmtpError::Server {
                code: reply.code,
                message: format!("EHLO rejected: {}", reply.text()),
            });
        }
        self.capabilities = EhloCapabilities::parse(&reply);
        Ok(())
    }

    /// Upgrade the plain-text connection to TLS, then re-issue EHLO
    /// (RFC 3207 §4.2).
    pub fn starttls(&mut self) -> SmtpResult<()> {
        if self.tls_active {
            return Ok(());
        }
        let reply = self.command("STARTTLS")?;
        if !reply.is_positive() {
            return Err(SmtpError::Tls(format!("STARTTLS rejected: {}", reply.text())));
        }

        let stream = self
            .stream
            .take()
            .ok_or_else(|| SmtpError::Io("not connected".into()))?;
        let tcp = match stream {
            Stream::Plain(r) => r.into_inner(),
            tls @ Stream::Tls(_) => {
                self.stream = Some(tls);
                return Err(SmtpError::Tls("already using TLS".into()));
            }
        };

        let tls = Self::tls_handshake(&self.host, tcp)?;
        self.stream = Some(Stream::Tls(BufReader::new(tls)));
        self.tls_active = true;
        info!("STARTTLS upgrade successful");

        self.ehlo()
    }

    fn tls_handshake(
        host: &str,
        tcp: TcpStream,
    ) -> SmtpResult<StreamOwned<ClientConnection, TcpStream>> {
        let mut roots = rustls::RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let config = rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();

        let server_name = rustls::pki_types::ServerName::try_from(host.to_string())
            .map_err(|e| SmtpError::Tls(format!("invalid server name: {}", e)))?;
        let conn = ClientConnection::new(Arc::new(config), server_name)
            .map_err(|e| SmtpError::Tls(e.to_string()))?;

        Ok(StreamOwned::new(conn, tcp))
    }

    /// Authenticate with AUTH PLAIN when advertised, AUTH LOGIN otherwise.
    pub fn login(&mut self, username: &str, password: &str) -> SmtpResult<()> {
        if self.capabilities.supports_auth("PLAIN") {
            self.auth_plain(username, password)
        } else {
            self.auth_login(username, password)
        }
    }

    /// AUTH PLAIN: `\0username\0password`, base64, in one shot.
    fn auth_plain(&mut self, username: &str, password: &str) -> SmtpResult<()> {
        let encoded = build_plain_payload(username, password);
        let reply = self.command(&format!("AUTH PLAIN {}", encoded))?;
        if reply.is_positive() {
            self.authenticated = true;
            info!("authenticated as {}", username);
            Ok(())
        } else {
            Err(SmtpError::Auth(format!(
                "AUTH PLAIN failed: {} {}",
                reply.code,
                reply.text()
            )))
        }
    }

    /// AUTH LOGIN: challenge-response with base64 username then password.
    fn auth_login(&mut self, username: &str, password: &str) -> SmtpResult<()> {
        let reply = self.command("AUTH LOGIN")?;
        if !reply.is_intermediate() {
            return Err(SmtpError::Auth(format!(
                "AUTH LOGIN rejected: {} {}",
                reply.code,
                reply.text()
            )));
        }

        let user_b64 = base64::engine::general_purpose::STANDARD.encode(username.as_bytes());
        let reply = self.command(&user_b64)?;
        if !reply.is_intermediate() {
            return Err(SmtpError::Auth(format!(
                "AUTH LOGIN username rejected: {} {}",
                reply.code,
                reply.text()
            )));
        }

        let pass_b64 = base64::engine::general_purpose::STANDARD.encode(password.as_bytes());
        let reply = self.command(&pass_b64)?;
        if reply.is_positive() {
            self.authenticated = true;
            info!("authenticated as {}", username);
            Ok(())
        } else {
            Err(SmtpError::Auth(format!(
                "AUTH LOGIN password rejected: {} {}",
                reply.code,
                reply.text()
            )))
        }
    }

    /// Issue MAIL FROM.
    pub fn mail_from(&mut self, sender: &str) -> SmtpResult<()> {
        let reply = self.command(&format!("MAIL FROM:<{}>", sender))?;
        if reply.is_error() {
            return Err(SmtpError::Server {
                code: reply.code,
                message: format!("MAIL FROM rejected: {}", reply.text()),
            });
        }
        Ok(())
    }

    /// Issue RCPT TO.
    pub fn rcpt_to(&mut self, recipient: &str) -> SmtpResult<()> {
        let reply = self.command(&format!("RCPT TO:<{}>", recipient))?;
        if reply.is_error() {
            return Err(SmtpError::Server {
                code: reply.code,
                message: format!("RCPT TO rejected for {}: {}", recipient, reply.text()),
            });
        }
        Ok(())
    }

    /// Issue DATA and transmit the message body.
    pub fn data(&mut self, body: &str) -> SmtpResult<()> {
        let reply = self.command("DATA")?;
        if !reply.is_intermediate() {
            return Err(SmtpError::Server {
                code: reply.code,
                message: format!("DATA rejected: {}", reply.text()),
            });
        }

        let body = dot_stuff(body);
        self.write_raw(body.as_bytes())?;
        self.write_raw(b".\r\n")?;
        self.flush()?;

        let reply = self.read_reply()?;
        if reply.is_error() {
            return Err(SmtpError::Server {
                code: reply.code,
                message: format!("DATA body rejected: {}", reply.text()),
            });
        }
        Ok(())
    }

    /// Close the connection gracefully via QUIT.
    pub fn quit(&mut self) -> SmtpResult<()> {
        if self.stream.is_some() {
            let _ = self.command("QUIT");
            self.stream = None;
        }
        self.tls_active = false;
        self.authenticated = false;
        info!("SMTP connection closed");
        Ok(())
    }

    /// Send a command and read the reply.
    fn command(&mut self, cmd: &str) -> SmtpResult<SmtpReply> {
        debug!("C: {}", cmd);
        self.write_raw(format!("{}\r\n", cmd).as_bytes())?;
        self.flush()?;
        self.read_reply()
    }

    /// Read a complete (possibly multi-line) reply.
    fn read_reply(&mut self) -> SmtpResult<SmtpReply> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| SmtpError::Io("not connected".into()))?;

        let mut full_response = String::new();
        loop {
            let mut line = String::new();
            let n = stream.read_line(&mut line)?;
            if n == 0 {
                return Err(SmtpError::Io("connection closed by server".into()));
            }
            full_response.push_str(&line);
            debug!("S: {}", line.trim_end());

            // Final line: code followed by a space, not a dash.
            if line.len() >= 4 && line.as_bytes()[3] == b' ' {
                break;
            }
        }

        SmtpReply::parse(&full_response)
    }

    fn write_raw(&mut self, data: &[u8]) -> SmtpResult<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| SmtpError::Io("not connected".into()))?;
        stream.write_all(data)
    }

    fn flush(&mut self) -> SmtpResult<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| SmtpError::Io("not connected".into()))?;
        stream.flush()
    }
}

impl Transport for SmtpSession {
    /// One MAIL FROM / RCPT TO / DATA transaction on the shared connection.
    fn send(&mut self, from: &str, to: &str, raw: &str) -> SmtpResult<()> {
        self.mail_from(from)?;
        self.rcpt_to(to)?;
        self.data(raw)?;
        self.messages_sent += 1;
        Ok(())
    }
}

impl Drop for SmtpSession {
    fn drop(&mut self) {
        if self.stream.is_some() {
            let _ = self.quit();
        }
    }
}

/// Build the AUTH PLAIN payload.
pub fn build_plain_payload(username: &str, password: &str) -> String {
    let payload = format!("\0{}\0{}", username, password);
    base64::engine::general_purpose::STANDARD.encode(payload.as_bytes())
}

/// SMTP dot-stuffing: lines starting with '.' get an extra '.' prepended,
/// and line endings are normalized to CRLF with a trailing CRLF.
pub fn dot_stuff(body: &str) -> String {
    let mut result = String::with_capacity(body.len() + 64);
    for line in body.split('\n') {
        let line = line.trim_end_matches('\r');
        if line.starts_with('.') {
            result.push('.');
        }
        result.push_str(line);
        result.push_str("\r\n");
    }
    result
}
