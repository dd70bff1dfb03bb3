use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Everything one run needs: SMTP endpoint, credentials, message template,
/// source directory and the per-email size limit.
///
/// Any front end can construct this record (CLI flags, a JSON file, or
/// both); it is validated once, before any grouping or sending happens.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP submission port.
    pub port: u16,
    /// Account username used for authentication.
    pub username: String,
    /// Account password used for authentication.
    pub password: String,
    /// Sender address; empty means "use the username".
    pub from_address: String,
    /// Recipient address.
    pub to_address: String,
    /// Subject line; each generated message gets a `k/N` suffix.
    pub subject: String,
    /// Plain-text body shared by every generated message.
    pub body: String,
    /// Directory whose immediate files get attached.
    pub directory: PathBuf,
    /// Maximum total attachment size per email, in bytes.
    pub max_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".into(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from_address: String::new(),
            to_address: String::new(),
            subject: String::new(),
            body: String::new(),
            directory: PathBuf::new(),
            max_size: 0,
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file.
    ///
    /// Malformed numeric fields (port, max_size) surface here with the
    /// parser's message rather than crashing later.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Fill in derivable fields: an empty from-address falls back to the
    /// username.
    pub fn resolve(&mut self) {
        if self.from_address.is_empty() {
            self.from_address = self.username.clone();
        }
    }

    /// Check the record before any I/O happens.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(invalid("host", "must not be empty"));
        }
        if self.port == 0 {
            return Err(invalid("port", "must be a positive integer"));
        }
        if self.username.is_empty() {
            return Err(invalid("username", "must not be empty"));
        }
        if self.from_address.is_empty() {
            return Err(invalid("from_address", "must not be empty"));
        }
        if self.to_address.is_empty() {
            return Err(invalid("to_address", "must not be empty"));
        }
        if self.directory.as_os_str().is_empty() {
            return Err(invalid("directory", "must not be empty"));
        }
        if self.max_size == 0 {
            return Err(invalid(
                "max_size",
                "must be a positive number of bytes (0 would make every file oversized)",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
