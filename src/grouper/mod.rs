mod packer;
mod scan;

#[cfg(test)]
mod tests;

pub use packer::group_files;
pub use scan::{scan_directory, ScanError};

use std::path::PathBuf;

/// A candidate attachment: its path and byte size.
///
/// The size is read once at scan time and treated as immutable for the
/// run; file contents are only read later, at send time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub size: u64,
}

impl FileEntry {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }

    /// Base name with the directory stripped, used as the attachment
    /// filename.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// A contiguous run of input files sent together as one email's
/// attachments. Never empty once emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Group {
    pub entries: Vec<FileEntry>,
}

impl Group {
    /// Combined size of all entries in bytes.
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Output of the grouping pass: the groups to send, plus the files that
/// were skipped because they exceed the limit on their own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupPlan {
    pub groups: Vec<Group>,
    pub skipped: Vec<FileEntry>,
}

impl GroupPlan {
    /// Number of files that made it into a group.
    pub fn file_count(&self) -> usize {
        self.groups.iter().map(|g| g.len()).sum()
    }
}
