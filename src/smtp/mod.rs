mod client;


pub use client::SmtpSession;

use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SmtpError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("TLS negotiation failed: {0}")]
    Tls(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Server rejected command ({code}): {message}")]
    Server { code: u16, message: String },
}

pub type SmtpResult<T> = Result<T, SmtpError>;

/// An authenticated mail-submission session that accepts sequential send
/// transactions. The dispatcher only depends on this seam, so tests can
/// substitute a recording transport.
pub trait Transport {
    /// Transmit one serialized message from `from` to `to`.
    fn send(&mut self, from: &str, to: &str, raw: &str) -> SmtpResult<()>;
}

/// A parsed SMTP reply (single or multi-line).
#[derive(Debug, Clone)]
pub struct SmtpReply {
    /// The 3-digit reply code.
    pub code: u16,
    /// Reply text lines, code stripped.
    pub lines: Vec<String>,
}

impl SmtpReply {
    /// Positive completion (2xx).
    pub fn is_positive(&self) -> bool {
        (200..300).contains(&self.code)
    }

    /// Positive intermediate (3xx), e.g. the DATA go-ahead.
    pub fn is_intermediate(&self) -> bool {
        (300..400).contains(&self.code)
    }

    pub fn is_error(&self) -> bool {
        self.code >= 400
    }

    /// The full reply text.
    pub fn text(&self) -> String {
        self.lines.join(" / ")
    }

    /// Parse a raw reply. Multi-line replies use `code-text` continuation
    /// lines terminated by a `code text` line.
    pub fn parse(raw: &str) -> SmtpResult<Self> {
        let mut code: Option<u16> = None;
        let mut lines = Vec::new();

        for line in raw.lines() {
            if line.len() < 3 {
                continue;
            }
            let c: u16 = line[..3]
                .parse()
                .map_err(|_| SmtpError::Io(format!("invalid reply code in: {}", line)))?;
            if code.is_none() {
                code = Some(c);
            }
            let text = if line.len() > 4 { &line[4..] } else { "" };
            lines.push(text.to_string());
        }

        match code {
            Some(code) => Ok(SmtpReply { code, lines }),
            None => Err(SmtpError::Io("empty SMTP reply".into())),
        }
    }
}

impl fmt::Display for SmtpReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.text())
    }
}

/// Capabilities advertised in the EHLO response.
#[derive(Debug, Clone, Default)]
pub struct EhloCapabilities {
    /// The server greeting name.
    pub server_name: String,
    /// Mechanisms listed after AUTH.
    pub auth_mechanisms: Vec<String>,
    /// STARTTLS advertised.
    pub starttls: bool,
    /// Maximum message size (SIZE extension).
    pub max_size: Option<u64>,
}

impl EhloCapabilities {
    /// Parse EHLO response lines into a capability set.
    pub fn parse(reply: &SmtpReply) -> Self {
        let mut caps = Self::default();
        for (i, line) in reply.lines.iter().enumerate() {
            if i == 0 {
                caps.server_name = line.clone();
                continue;
            }
            let upper = line.to_uppercase();
            let mut parts = upper.splitn(2, ' ');
            let keyword = parts.next().unwrap_or("");
            let param = parts.next().unwrap_or("");

            match keyword {
                "AUTH" => {
                    caps.auth_mechanisms =
                        param.split_whitespace().map(|s| s.to_string()).collect();
                }
                "STARTTLS" => caps.starttls = true,
                "SIZE" => caps.max_size = param.parse().ok(),
                _ => {}
            }
        }
        caps
    }

    /// Check whether a specific auth mechanism is supported.
    pub fn supports_auth(&self, method: &str) -> bool {
        let upper = method.to_uppercase();
        self.auth_mechanisms.iter().any(|m| m == &upper)
    }
}
