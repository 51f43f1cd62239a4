//! Error types shared by the scanner, organizer, resolver and task layer.
//!
//! Directory-level variants abort an operation before any file is touched.
//! The per-file variants (`FileReadError`, `FileMoveError`, `FileDeleteError`)
//! never abort a batch; they are collected into [`FileFailure`] lists on the
//! operation's report instead.

use crate::config::ConfigError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by sortdir operations.
#[derive(Debug, Error)]
pub enum SortError {
    /// The directory does not exist or is not a directory.
    #[error("directory not found: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    /// The directory exists but could not be listed.
    #[error("cannot read directory {}: {source}", path.display())]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The destination directory could not be created.
    #[error("cannot create directory {}: {source}", path.display())]
    DirectoryNotCreatable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A single file could not be read (hashing).
    #[error("failed to read {}: {source}", path.display())]
    FileReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A single file could not be moved to its category directory.
    #[error("failed to move {} to {}: {source}", from.display(), to.display())]
    FileMoveError {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A single file could not be deleted.
    #[error("failed to delete {}: {source}", path.display())]
    FileDeleteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A category rule with an empty name or no usable extensions.
    #[error("invalid rule '{name}': {reason}")]
    InvalidRule { name: String, reason: String },

    /// The operation was cancelled after `processed` files.
    #[error("operation cancelled after {processed} files")]
    Cancelled { processed: usize },

    /// Another operation of the same kind is running on this directory.
    #[error("a {kind} operation is already running on {}", path.display())]
    AlreadyRunning { kind: &'static str, path: PathBuf },

    /// The background worker could not be started or panicked.
    #[error("background worker for {kind} failed before producing a result")]
    WorkerPanicked { kind: &'static str },

    /// Configuration loading failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for sortdir operations.
pub type SortResult<T> = Result<T, SortError>;

/// A per-file failure collected during a batch operation.
#[derive(Debug)]
pub struct FileFailure {
    /// Name of the file within the operated directory, or the full path for
    /// explicit deletions.
    pub file: String,
    /// What went wrong.
    pub error: SortError,
}

impl FileFailure {
    pub fn new(file: impl Into<String>, error: SortError) -> Self {
        Self {
            file: file.into(),
            error,
        }
    }
}

impl std::fmt::Display for FileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.file, self.error)
    }
}
