//! Single-level directory snapshots.
//!
//! Both the duplicate scanner and the organizer work on a snapshot of the
//! regular files directly inside a directory, taken once at the start of the
//! operation. Changes made to the directory afterwards are not observed.

use crate::error::{SortError, SortResult};
use chrono::{DateTime, Local};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A regular file found in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// File name for display and matching. Invalid UTF-8 is replaced.
    pub name: String,
    /// The exact file name on disk. Paths are always built from this one.
    pub file_name: OsString,
    /// Full path to the file.
    pub path: PathBuf,
}

/// Metadata fetched on demand for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileDetails {
    pub size: u64,
    pub modified: DateTime<Local>,
}

impl FileDetails {
    /// Modification time as `YYYY-MM-DD HH:MM:SS` in local time.
    pub fn modified_display(&self) -> String {
        self.modified.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

impl FileEntry {
    /// Builds an entry from a full path; the name is its last component.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| path.as_os_str().to_os_string());
        Self {
            name: file_name.to_string_lossy().into_owned(),
            file_name,
            path,
        }
    }

    /// The name as UTF-8, or `None` if the file name is not valid UTF-8.
    pub fn utf8_name(&self) -> Option<&str> {
        self.file_name.to_str()
    }

    /// Reads size and modification time. Not needed for classification or
    /// grouping, so it is never called during a scan.
    pub fn details(&self) -> io::Result<FileDetails> {
        let metadata = fs::metadata(&self.path)?;
        Ok(FileDetails {
            size: metadata.len(),
            modified: DateTime::<Local>::from(metadata.modified()?),
        })
    }
}

/// Checks that `dir` exists and is a directory.
///
/// # Errors
///
/// [`SortError::DirectoryNotFound`] if it is missing or not a directory,
/// [`SortError::DirectoryUnreadable`] if its metadata cannot be read.
pub fn ensure_directory(dir: &Path) -> SortResult<()> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(SortError::DirectoryNotFound {
            path: dir.to_path_buf(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(SortError::DirectoryNotFound {
            path: dir.to_path_buf(),
        }),
        Err(e) => Err(SortError::DirectoryUnreadable {
            path: dir.to_path_buf(),
            source: e,
        }),
    }
}

/// Lists the regular files directly inside `dir`, sorted by name.
///
/// Subdirectories and symbolic links are skipped; there is no recursion.
/// Sorting makes the listing order, and with it the order of files inside a
/// duplicate group, the same from one run to the next.
///
/// # Errors
///
/// Fails only when the directory itself is missing or cannot be listed.
pub fn list_files(dir: &Path) -> SortResult<Vec<FileEntry>> {
    ensure_directory(dir)?;

    let entries = fs::read_dir(dir).map_err(|e| SortError::DirectoryUnreadable {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        match entry.file_type() {
            Ok(file_type) if file_type.is_file() => {
                files.push(FileEntry::from_path(entry.path()));
            }
            Ok(_) => {}
            Err(e) => {
                log::warn!(
                    "Skipping {}: cannot determine file type: {}",
                    entry.path().display(),
                    e
                );
            }
        }
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    log::debug!("Listed {} files in {}", files.len(), dir.display());
    Ok(files)
}
