mod builder;

#[cfg(test)]
mod tests;

pub use builder::{build_mime, encode_header_value};

use std::path::Path;

use base64::Engine;
use thiserror::Error;

use crate::grouper::Group;

/// Content type used for every attachment part.
pub const ATTACHMENT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Error, Debug)]
pub enum MessageError {
    #[error("Failed to read attachment {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid attachment data: {0}")]
    Decode(String),
}

/// The fields shared by every generated message. Immutable for the run.
#[derive(Debug, Clone)]
pub struct MessageTemplate {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// A binary attachment part, stored base64-encoded.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Base name of the source file (directory stripped).
    pub filename: String,
    /// Base64-encoded payload.
    pub data_base64: String,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, data: &[u8]) -> Self {
        Self {
            filename: filename.into(),
            data_base64: base64::engine::general_purpose::STANDARD.encode(data),
        }
    }

    /// Read a file's full contents from disk. Called at send time; the
    /// grouping pass only ever looked at size metadata.
    pub fn from_file(path: &Path) -> Result<Self, MessageError> {
        let data = std::fs::read(path).map_err(|source| MessageError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(filename, &data))
    }

    /// Decode the payload back to raw bytes.
    pub fn decode_data(&self) -> Result<Vec<u8>, MessageError> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data_base64)
            .map_err(|e| MessageError::Decode(e.to_string()))
    }

    /// Approximate raw size in bytes.
    pub fn estimated_size(&self) -> usize {
        self.data_base64.len() * 3 / 4
    }
}

/// One email, built immediately before transmission and discarded after.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    /// Message-ID value.
    pub id: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

impl OutgoingMessage {
    /// Build the message for group `index` (zero-based) out of `total`.
    ///
    /// The subject carries a `k/N` indicator and attachment payloads are
    /// read from disk here, in group order.
    pub fn from_group(
        template: &MessageTemplate,
        group: &Group,
        index: usize,
        total: usize,
    ) -> Result<Self, MessageError> {
        let mut attachments = Vec::with_capacity(group.len());
        for entry in &group.entries {
            attachments.push(Attachment::from_file(&entry.path)?);
        }

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            from: template.from.clone(),
            to: template.to.clone(),
            subject: format!("{} {}/{}", template.subject, index + 1, total),
            body: template.body.clone(),
            attachments,
        })
    }

    /// Rough wire size, used to presize the serialization buffer.
    pub fn estimated_size(&self) -> usize {
        let attachments: usize = self.attachments.iter().map(|a| a.data_base64.len()).sum();
        self.body.len() + self.subject.len() + attachments + 512
    }
}
