use std::path::Path;

use thiserror::Error;
use walkdir::WalkDir;

use super::FileEntry;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Failed to read directory entry: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Collect the immediate files of `dir` together with their byte sizes.
///
/// Does not descend into subdirectories and does not filter by file type.
/// Entries are sorted by file name so the same directory always produces
/// the same grouping, regardless of filesystem iteration order.
pub fn scan_directory(dir: &Path) -> Result<Vec<FileEntry>, ScanError> {
    if !dir.is_dir() {
        return Err(ScanError::NotADirectory(dir.display().to_string()));
    }

    let mut entries = Vec::new();
    for item in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let item = item?;
        if !item.file_type().is_file() {
            continue;
        }
        let size = item.metadata()?.len();
        entries.push(FileEntry::new(item.into_path(), size));
    }

    Ok(entries)
}
