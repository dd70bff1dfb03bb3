// Public API exports
pub mod config;
pub mod dispatcher;
pub mod grouper;
pub mod message;
pub mod smtp;

// Re-export main types for convenience
pub use config::{Config, ConfigError};

pub use grouper::{group_files, scan_directory, FileEntry, Group, GroupPlan, ScanError};

pub use message::{build_mime, Attachment, MessageError, MessageTemplate, OutgoingMessage};

pub use smtp::{EhloCapabilities, SmtpError, SmtpReply, SmtpSession, Transport};

pub use dispatcher::{dispatch, DispatchError, MessageStream};
